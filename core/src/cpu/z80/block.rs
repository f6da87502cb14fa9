use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80, tables};

impl Z80 {
    // --- Block Transfer ---

    /// LDI (ED A0) / LDD (ED A8) — 16 T: (DE) ← (HL), both pointers step,
    /// BC counts down. S/Z/C preserved; PV = BC != 0; X/Y from bits 3/1 of
    /// (transferred byte + A); H = N = 0.
    pub(crate) fn op_ldi_ldd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let dec = (self.op_code & 0x08) != 0;
        let hl = self.get_hl();
        let value = self.read_mem(bus, hl);
        let de = self.get_de();
        self.write_mem(bus, de, value);
        self.delay(2);

        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(hl.wrapping_add(delta));
        self.set_de(de.wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));

        let n = value.wrapping_add(self.a);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        if n & 0x08 != 0 {
            f |= Flag::X as u8;
        }
        if n & 0x02 != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
    }

    /// LDIR (ED B0) / LDDR (ED B8) — 21 T repeating / 16 T on the final
    /// iteration. The repeat rewinds PC over the two opcode bytes;
    /// WZ = PC + 1 while repeating.
    pub(crate) fn op_ldir_lddr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.op_ldi_ldd(bus);
        if self.get_bc() != 0 {
            self.delay(5);
            self.pc = self.pc.wrapping_sub(2);
            self.wz = self.pc.wrapping_add(1);
        }
    }

    // --- Block Compare ---

    /// CPI (ED A1) / CPD (ED A9) — 16 T: compare A with (HL), HL and WZ
    /// step, BC counts down. C preserved; N set; PV = BC != 0; X/Y from
    /// bits 3/1 of (A - value - H).
    pub(crate) fn op_cpi_cpd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let dec = (self.op_code & 0x08) != 0;
        let hl = self.get_hl();
        let value = self.read_mem(bus, hl);
        self.delay(5);

        let result = self.a.wrapping_sub(value);
        let half = (self.a & 0x0F) < (value & 0x0F);
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(hl.wrapping_add(delta));
        self.set_bc(self.get_bc().wrapping_sub(1));
        self.wz = self.wz.wrapping_add(delta);

        let mut f = (self.f & Flag::C as u8) | Flag::N as u8 | (result & Flag::S as u8);
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if half {
            f |= Flag::H as u8;
        }
        if self.get_bc() != 0 {
            f |= Flag::PV as u8;
        }
        let n = result.wrapping_sub(half as u8);
        if n & 0x08 != 0 {
            f |= Flag::X as u8;
        }
        if n & 0x02 != 0 {
            f |= Flag::Y as u8;
        }
        self.f = f;
    }

    /// CPIR (ED B1) / CPDR (ED B9) — 21 T repeating / 16 T when done.
    /// Repeats while BC != 0 and the comparison missed.
    pub(crate) fn op_cpir_cpdr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.op_cpi_cpd(bus);
        if self.get_bc() != 0 && self.f & Flag::Z as u8 == 0 {
            self.delay(5);
            self.pc = self.pc.wrapping_sub(2);
            self.wz = self.pc.wrapping_add(1);
        }
    }

    // --- Block I/O ---

    /// INI (ED A2) / IND (ED AA) — 16 T: port (BC) → (HL), HL steps, B
    /// counts down. The port read happens with the pre-decrement B;
    /// WZ = BC ± 1 from that same BC.
    pub(crate) fn op_ini_ind<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let dec = (self.op_code & 0x08) != 0;
        self.delay(1);
        let port = self.get_bc();
        self.wz = if dec {
            port.wrapping_sub(1)
        } else {
            port.wrapping_add(1)
        };
        let value = self.read_io(bus, port);
        self.b = self.b.wrapping_sub(1);
        let hl = self.get_hl();
        self.write_mem(bus, hl, value);
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(hl.wrapping_add(delta));

        let step_c = if dec {
            self.c.wrapping_sub(1)
        } else {
            self.c.wrapping_add(1)
        };
        let k = value as u16 + step_c as u16;
        self.apply_block_io_flags(value, k);
    }

    /// INIR (ED B2) / INDR (ED BA) — 21 T repeating / 16 T when done.
    pub(crate) fn op_inir_indr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.op_ini_ind(bus);
        if self.b != 0 {
            self.delay(5);
            self.pc = self.pc.wrapping_sub(2);
        }
    }

    /// OUTI (ED A3) / OUTD (ED AB) — 16 T: (HL) → port (BC), HL steps, B
    /// counts down. B decrements before the port write; WZ = BC ± 1 from
    /// the decremented BC.
    pub(crate) fn op_outi_outd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let dec = (self.op_code & 0x08) != 0;
        self.delay(1);
        let hl = self.get_hl();
        let value = self.read_mem(bus, hl);
        self.b = self.b.wrapping_sub(1);
        let port = self.get_bc();
        self.write_io(bus, port, value);
        self.wz = if dec {
            port.wrapping_sub(1)
        } else {
            port.wrapping_add(1)
        };
        let delta: u16 = if dec { 0xFFFF } else { 1 };
        self.set_hl(hl.wrapping_add(delta));

        let k = value as u16 + self.l as u16;
        self.apply_block_io_flags(value, k);
    }

    /// OTIR (ED B3) / OTDR (ED BB) — 21 T repeating / 16 T when done.
    pub(crate) fn op_otir_otdr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.op_outi_outd(bus);
        if self.b != 0 {
            self.delay(5);
            self.pc = self.pc.wrapping_sub(2);
        }
    }

    /// Block I/O flag rule: S/Z/X/Y from the decremented B; N from bit 7 of
    /// the transferred byte; H and C from the 8-bit overflow of `k`
    /// (value + stepped C for IN, value + L for OUT); PV =
    /// parity((k & 7) XOR B).
    fn apply_block_io_flags(&mut self, value: u8, k: u16) {
        let mut f = self.b & (Flag::S as u8 | Flag::X as u8 | Flag::Y as u8);
        if self.b == 0 {
            f |= Flag::Z as u8;
        }
        if value & 0x80 != 0 {
            f |= Flag::N as u8;
        }
        if k > 0xFF {
            f |= Flag::H as u8 | Flag::C as u8;
        }
        f |= tables::ALU_LOG_OP_FLAGS[((k as u8 & 0x07) ^ self.b) as usize] & Flag::PV as u8;
        self.f = f;
    }
}
