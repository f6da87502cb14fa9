use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Evaluate a condition code (3 bits from opcode bits 5-3).
    /// 0=NZ, 1=Z, 2=NC, 3=C, 4=PO, 5=PE, 6=P, 7=M
    pub(crate) fn eval_condition(&self, cc: u8) -> bool {
        match cc {
            0 => (self.f & Flag::Z as u8) == 0,  // NZ
            1 => (self.f & Flag::Z as u8) != 0,  // Z
            2 => (self.f & Flag::C as u8) == 0,  // NC
            3 => (self.f & Flag::C as u8) != 0,  // C
            4 => (self.f & Flag::PV as u8) == 0, // PO (parity odd)
            5 => (self.f & Flag::PV as u8) != 0, // PE (parity even)
            6 => (self.f & Flag::S as u8) == 0,  // P (positive)
            7 => (self.f & Flag::S as u8) != 0,  // M (minus)
            _ => unreachable!(),
        }
    }

    /// JP nn — 10 T: M1 + MR + MR. WZ = nn.
    pub(crate) fn op_jp_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        self.wz = ((high as u16) << 8) | low as u16;
        self.pc = self.wz;
    }

    /// JP cc,nn — 10 T whether taken or not. WZ = nn either way.
    pub(crate) fn op_jp_cc_nn<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let cc = (opcode >> 3) & 0x07;
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        self.wz = ((high as u16) << 8) | low as u16;
        if self.eval_condition(cc) {
            self.pc = self.wz;
        }
    }

    /// JR e — 12 T: M1 + MR + internal(5). WZ = destination.
    pub(crate) fn op_jr_e<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let disp = self.read_code(bus) as i8;
        self.delay(5);
        self.pc = self.pc.wrapping_add(disp as i16 as u16);
        self.wz = self.pc;
    }

    /// JR cc,e — 12 T taken / 7 T not taken (NZ/Z/NC/C only)
    pub(crate) fn op_jr_cc_e<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let cc = (opcode >> 3) & 0x03;
        let disp = self.read_code(bus) as i8;
        if self.eval_condition(cc) {
            self.delay(5);
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            self.wz = self.pc;
        }
    }

    /// JP (HL) — 4 T. Really "JP HL": PC from HL/IX/IY, no memory access.
    pub(crate) fn op_jp_hl(&mut self) {
        self.pc = self.get_rp(2);
    }

    /// DJNZ e — 13 T taken / 8 T not taken. B decrements during the
    /// stretched M1 before the displacement read.
    pub(crate) fn op_djnz<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.delay(1);
        self.b = self.b.wrapping_sub(1);
        let disp = self.read_code(bus) as i8;
        if self.b != 0 {
            self.delay(5);
            self.pc = self.pc.wrapping_add(disp as i16 as u16);
            self.wz = self.pc;
        }
    }

    /// CALL nn — 17 T: M1 + MR + MR + internal(1) + MW + MW. WZ = nn.
    pub(crate) fn op_call_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        self.wz = ((high as u16) << 8) | low as u16;
        self.delay(1);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, (self.pc >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, self.pc as u8);
        self.pc = self.wz;
    }

    /// CALL cc,nn — 17 T taken / 10 T not taken. Both address bytes are read
    /// either way; WZ = nn either way.
    pub(crate) fn op_call_cc_nn<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let cc = (opcode >> 3) & 0x07;
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        self.wz = ((high as u16) << 8) | low as u16;
        if self.eval_condition(cc) {
            self.delay(1);
            self.sp = self.sp.wrapping_sub(1);
            self.write_mem(bus, self.sp, (self.pc >> 8) as u8);
            self.sp = self.sp.wrapping_sub(1);
            self.write_mem(bus, self.sp, self.pc as u8);
            self.pc = self.wz;
        }
    }

    /// RET — 10 T: M1 + MR + MR. WZ = return address.
    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_mem(bus, self.sp);
        self.sp = self.sp.wrapping_add(1);
        let high = self.read_mem(bus, self.sp);
        self.sp = self.sp.wrapping_add(1);
        self.pc = ((high as u16) << 8) | low as u16;
        self.wz = self.pc;
    }

    /// RET cc — 11 T taken / 5 T not taken (condition costs the stretched M1)
    pub(crate) fn op_ret_cc<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let cc = (opcode >> 3) & 0x07;
        self.delay(1);
        if self.eval_condition(cc) {
            let low = self.read_mem(bus, self.sp);
            self.sp = self.sp.wrapping_add(1);
            let high = self.read_mem(bus, self.sp);
            self.sp = self.sp.wrapping_add(1);
            self.pc = ((high as u16) << 8) | low as u16;
            self.wz = self.pc;
        }
    }

    /// RST p — 11 T: M1(5) + MW + MW. Target = opcode & 0x38; WZ = target.
    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        self.delay(1);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, (self.pc >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, self.pc as u8);
        self.pc = (opcode & 0x38) as u16;
        self.wz = self.pc;
    }

    /// DI — 4 T
    pub(crate) fn op_di(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
    }

    /// EI — 4 T. The interrupt block holds through the next instruction.
    pub(crate) fn op_ei(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
        self.is_interrupt_blocked = true;
    }

    /// IN A,(n) — 11 T: port address is A on the upper half, n on the lower.
    /// WZ = (A<<8 | n) + 1, with the pre-read A.
    pub(crate) fn op_in_a_n<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let port = ((self.a as u16) << 8) | low as u16;
        self.a = self.read_io(bus, port);
        self.wz = port.wrapping_add(1);
    }

    /// OUT (n),A — 11 T. WZ low = (n+1) & 0xFF, WZ high = A.
    pub(crate) fn op_out_n_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let port = ((self.a as u16) << 8) | low as u16;
        self.write_io(bus, port, self.a);
        self.wz = ((self.a as u16) << 8) | (low.wrapping_add(1) as u16);
    }

    /// RETN/RETI (ED) — 14 T: pop PC, IFF2 → IFF1. WZ = return address.
    /// Every ED 01 xxx 101 slot behaves this way; ED 4D is the RETI alias.
    pub(crate) fn op_retn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.iff1 = self.iff2;
        let low = self.read_mem(bus, self.sp);
        self.sp = self.sp.wrapping_add(1);
        let high = self.read_mem(bus, self.sp);
        self.sp = self.sp.wrapping_add(1);
        self.pc = ((high as u16) << 8) | low as u16;
        self.wz = self.pc;
    }

    /// IM 0/1/2 (ED) — 8 T. Bits 4-3: 00/01 → IM 0, 10 → IM 1, 11 → IM 2.
    pub(crate) fn op_im(&mut self, opcode: u8) {
        self.interrupt_mode = match (opcode >> 3) & 0x03 {
            0 | 1 => 0,
            2 => 1,
            3 => 2,
            _ => unreachable!(),
        };
    }
}
