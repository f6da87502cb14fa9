use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80, tables};

impl Z80 {
    /// Dispatch an ED-prefixed opcode. Undefined slots are 8 T NOPs; the
    /// Next-compatible extension set only decodes when the gate is on.
    pub(crate) fn dispatch_extended<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let opcode = self.op_code;
        match opcode {
            0x47 => self.op_ld_i_a(),      // LD I,A — 9T
            0x4F => self.op_ld_r_a(),      // LD R,A — 9T
            0x57 => self.op_ld_a_i(),      // LD A,I — 9T
            0x5F => self.op_ld_a_r(),      // LD A,R — 9T
            0x67 => self.op_rrd(bus),      // RRD — 18T
            0x6F => self.op_rld(bus),      // RLD — 18T

            // --- Block transfer/compare/IO ---
            0xA0 | 0xA8 => self.op_ldi_ldd(bus),   // LDI/LDD — 16T
            0xA1 | 0xA9 => self.op_cpi_cpd(bus),   // CPI/CPD — 16T
            0xA2 | 0xAA => self.op_ini_ind(bus),   // INI/IND — 16T
            0xA3 | 0xAB => self.op_outi_outd(bus), // OUTI/OUTD — 16T
            0xB0 | 0xB8 => self.op_ldir_lddr(bus), // LDIR/LDDR — 21/16T
            0xB1 | 0xB9 => self.op_cpir_cpdr(bus), // CPIR/CPDR — 21/16T
            0xB2 | 0xBA => self.op_inir_indr(bus), // INIR/INDR — 21/16T
            0xB3 | 0xBB => self.op_otir_otdr(bus), // OTIR/OTDR — 21/16T

            // --- Next-compatible extension set ---
            0x23 if self.allow_extended_instruction_set => self.op_swapnib(),
            0x24 if self.allow_extended_instruction_set => self.op_mirror_a(),
            0x27 if self.allow_extended_instruction_set => self.op_test_n(bus),
            0x30 if self.allow_extended_instruction_set => self.op_mul_de(),
            0x31..=0x33 if self.allow_extended_instruction_set => self.op_add_rr_a(opcode),
            0x34..=0x36 if self.allow_extended_instruction_set => self.op_add_rr_nn(opcode, bus),

            // --- Pattern-based (40-7F range) ---
            op if (op & 0xC7) == 0x40 => self.op_in_r_c(op, bus), // IN r,(C) — 12T
            op if (op & 0xC7) == 0x41 => self.op_out_c_r(op, bus), // OUT (C),r — 12T
            op if (op & 0xCF) == 0x42 => self.op_sbc_hl_rr(op),   // SBC HL,rr — 15T
            op if (op & 0xCF) == 0x43 => self.op_ld_nn_rr_ed(op, bus), // LD (nn),rr — 20T
            op if (op & 0xC7) == 0x44 => self.op_neg(),           // NEG — 8T
            op if (op & 0xC7) == 0x45 => self.op_retn(bus),       // RETN/RETI — 14T
            op if (op & 0xC7) == 0x46 => self.op_im(op),          // IM 0/1/2 — 8T
            op if (op & 0xCF) == 0x4A => self.op_adc_hl_rr(op),   // ADC HL,rr — 15T
            op if (op & 0xCF) == 0x4B => self.op_ld_rr_nn_ed(op, bus), // LD rr,(nn) — 20T

            // ED NOP — 8T
            _ => {}
        }
    }

    /// LD I,A — 9 T (stretched refresh cycle)
    fn op_ld_i_a(&mut self) {
        self.delay(1);
        self.i = self.a;
    }

    /// LD R,A — 9 T
    fn op_ld_r_a(&mut self) {
        self.delay(1);
        self.r = self.a;
    }

    /// LD A,I — 9 T. P/V reflects IFF2 so an interrupt routine can probe
    /// the pre-interrupt enable state; C preserved.
    fn op_ld_a_i(&mut self) {
        self.delay(1);
        self.a = self.i;
        self.apply_interrupt_register_flags();
    }

    /// LD A,R — 9 T. Same flag rule as LD A,I.
    fn op_ld_a_r(&mut self) {
        self.delay(1);
        self.a = self.r;
        self.apply_interrupt_register_flags();
    }

    fn apply_interrupt_register_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        f |= self.a & (Flag::S as u8 | Flag::X as u8 | Flag::Y as u8);
        if self.a == 0 {
            f |= Flag::Z as u8;
        }
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        self.f = f;
    }

    /// RRD — 18 T: low nibble of (HL) into A, A's low nibble rotated in.
    /// WZ = HL + 1.
    fn op_rrd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_hl();
        let value = self.read_mem(bus, addr);
        self.delay(4);
        let result = ((self.a & 0x0F) << 4) | (value >> 4);
        self.a = (self.a & 0xF0) | (value & 0x0F);
        self.write_mem(bus, addr, result);
        self.f = (self.f & Flag::C as u8) | tables::ALU_LOG_OP_FLAGS[self.a as usize];
        self.wz = addr.wrapping_add(1);
    }

    /// RLD — 18 T: the opposite nibble rotation. WZ = HL + 1.
    fn op_rld<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_hl();
        let value = self.read_mem(bus, addr);
        self.delay(4);
        let result = (value << 4) | (self.a & 0x0F);
        self.a = (self.a & 0xF0) | (value >> 4);
        self.write_mem(bus, addr, result);
        self.f = (self.f & Flag::C as u8) | tables::ALU_LOG_OP_FLAGS[self.a as usize];
        self.wz = addr.wrapping_add(1);
    }

    /// IN r,(C) — 12 T. r = 6 (ED 70) sets flags only. WZ = BC + 1.
    fn op_in_r_c<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let port = self.get_bc();
        let value = self.read_io(bus, port);
        if r != 6 {
            self.set_reg8(r, value);
        }
        self.f = (self.f & Flag::C as u8) | tables::ALU_LOG_OP_FLAGS[value as usize];
        self.wz = port.wrapping_add(1);
    }

    /// OUT (C),r — 12 T. r = 6 (ED 71) drives 0 (NMOS behavior). WZ = BC + 1.
    fn op_out_c_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let port = self.get_bc();
        let value = if r == 6 { 0 } else { self.get_reg8(r) };
        self.write_io(bus, port, value);
        self.wz = port.wrapping_add(1);
    }

    // --- Next-compatible extension set ---

    /// SWAPNIB (ED 23) — 8 T: swap A's nibbles, no flags
    fn op_swapnib(&mut self) {
        self.a = self.a.rotate_left(4);
    }

    /// MIRROR A (ED 24) — 8 T: reverse A's bit order, no flags
    fn op_mirror_a(&mut self) {
        self.a = self.a.reverse_bits();
    }

    /// TEST n (ED 27) — 11 T: AND flags without committing A
    fn op_test_n<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let value = self.read_code(bus);
        self.f = tables::ALU_LOG_OP_FLAGS[(self.a & value) as usize] | Flag::H as u8;
    }

    /// MUL D,E (ED 30) — 8 T: DE = D × E unsigned, no flags
    fn op_mul_de(&mut self) {
        self.set_de(self.d as u16 * self.e as u16);
    }

    /// ADD HL,A / ADD DE,A / ADD BC,A (ED 31/32/33) — 8 T, no flags
    fn op_add_rr_a(&mut self, opcode: u8) {
        let a = self.a as u16;
        match opcode {
            0x31 => self.set_hl(self.get_hl().wrapping_add(a)),
            0x32 => self.set_de(self.get_de().wrapping_add(a)),
            _ => self.set_bc(self.get_bc().wrapping_add(a)),
        }
    }

    /// ADD HL,nn / ADD DE,nn / ADD BC,nn (ED 34/35/36) — 16 T, no flags
    fn op_add_rr_nn<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let value = ((high as u16) << 8) | low as u16;
        self.delay(2);
        match opcode {
            0x34 => self.set_hl(self.get_hl().wrapping_add(value)),
            0x35 => self.set_de(self.get_de().wrapping_add(value)),
            _ => self.set_bc(self.get_bc().wrapping_add(value)),
        }
    }
}
