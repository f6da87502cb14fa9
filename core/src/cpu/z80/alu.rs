use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80, tables};

impl Z80 {
    /// ADD/ADC/SUB/SBC/AND/XOR/OR/CP against A, by 3-bit operation code.
    /// Flags come straight out of the precomputed tables; only the result
    /// byte is computed here.
    pub(crate) fn perform_alu_op(&mut self, op: u8, value: u8) {
        match op {
            0 => {
                // ADD: ADC with carry-in 0
                let index = ((self.a as usize) << 8) | value as usize;
                self.a = self.a.wrapping_add(value);
                self.f = tables::ADC_FLAGS[index];
            }
            1 => {
                // ADC
                let carry = (self.f & Flag::C as u8 != 0) as usize;
                let index = (carry << 16) | ((self.a as usize) << 8) | value as usize;
                self.a = self.a.wrapping_add(value).wrapping_add(carry as u8);
                self.f = tables::ADC_FLAGS[index];
            }
            2 => {
                // SUB: SBC with carry-in 0
                let index = ((self.a as usize) << 8) | value as usize;
                self.a = self.a.wrapping_sub(value);
                self.f = tables::SBC_FLAGS[index];
            }
            3 => {
                // SBC
                let carry = (self.f & Flag::C as u8 != 0) as usize;
                let index = (carry << 16) | ((self.a as usize) << 8) | value as usize;
                self.a = self.a.wrapping_sub(value).wrapping_sub(carry as u8);
                self.f = tables::SBC_FLAGS[index];
            }
            4 => {
                // AND sets H, the other logical ops clear it
                self.a &= value;
                self.f = tables::ALU_LOG_OP_FLAGS[self.a as usize] | Flag::H as u8;
            }
            5 => {
                // XOR
                self.a ^= value;
                self.f = tables::ALU_LOG_OP_FLAGS[self.a as usize];
            }
            6 => {
                // OR
                self.a |= value;
                self.f = tables::ALU_LOG_OP_FLAGS[self.a as usize];
            }
            7 => {
                // CP: SUB without committing A; X/Y come from the operand
                let index = ((self.a as usize) << 8) | value as usize;
                self.f = (tables::SBC_FLAGS[index] & !(Flag::X as u8 | Flag::Y as u8))
                    | (value & (Flag::X as u8 | Flag::Y as u8));
            }
            _ => unreachable!(),
        }
    }

    /// ALU A, r — 4 T (reg), 7 T ((HL)), 19 T ((IX+d))
    /// Opcode mask: 10 xxx zzz
    pub(crate) fn op_alu_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let alu_op = (opcode >> 3) & 0x07;
        let r = opcode & 0x07;

        let value = if r == 6 {
            let addr = self.effective_addr(bus, 5);
            self.read_mem(bus, addr)
        } else {
            self.get_reg8_ix(r)
        };
        self.perform_alu_op(alu_op, value);
    }

    /// ALU A, n — 7 T: M1 + MR
    /// Opcode mask: 11 xxx 110
    pub(crate) fn op_alu_n<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let alu_op = (opcode >> 3) & 0x07;
        let value = self.read_code(bus);
        self.perform_alu_op(alu_op, value);
    }

    /// INC/DEC r — 4 T (reg), 11 T ((HL)), 23 T ((IX+d))
    /// Opcode mask: 00 rrr 10x
    pub(crate) fn op_inc_dec_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;
        let is_dec = (opcode & 0x01) != 0;

        if r == 6 {
            // Read-modify-write with a 1 T internal stretch before the write
            let addr = self.effective_addr(bus, 5);
            let value = self.read_mem(bus, addr);
            let result = if is_dec {
                self.apply_dec_flags(value)
            } else {
                self.apply_inc_flags(value)
            };
            self.delay(1);
            self.write_mem(bus, addr, result);
        } else {
            let value = self.get_reg8_ix(r);
            let result = if is_dec {
                self.apply_dec_flags(value)
            } else {
                self.apply_inc_flags(value)
            };
            self.set_reg8_ix(r, result);
        }
    }

    fn apply_inc_flags(&mut self, value: u8) -> u8 {
        self.f = tables::INC_OP_FLAGS[value as usize] | (self.f & Flag::C as u8);
        value.wrapping_add(1)
    }

    fn apply_dec_flags(&mut self, value: u8) -> u8 {
        self.f = tables::DEC_OP_FLAGS[value as usize] | (self.f & Flag::C as u8);
        value.wrapping_sub(1)
    }

    /// ADD HL,rr (HL doubles as IX/IY under a prefix) — 11 T
    /// H from the bit-11 carry, C from bit 15; S/Z/PV preserved;
    /// X/Y from the result high byte. WZ = old HL + 1.
    pub(crate) fn op_add_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let hl = self.get_rp(2);
        let operand = self.get_rp(rp);
        self.wz = hl.wrapping_add(1);

        let sum = hl as u32 + operand as u32;
        let result = sum as u16;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        if (hl & 0x0FFF) + (operand & 0x0FFF) > 0x0FFF {
            f |= Flag::H as u8;
        }
        if sum > 0xFFFF {
            f |= Flag::C as u8;
        }
        self.set_rp(2, result);
        self.f = f;
        self.delay(7);
    }

    /// ADC HL,rr (ED) — 15 T, full flag update. WZ = old HL + 1.
    pub(crate) fn op_adc_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let hl = self.get_hl();
        let operand = self.get_rp(rp);
        let carry = (self.f & Flag::C as u8 != 0) as u32;
        self.wz = hl.wrapping_add(1);

        let sum = hl as u32 + operand as u32 + carry;
        let result = sum as u16;
        let mut f = ((result >> 8) as u8) & (Flag::S as u8 | Flag::X as u8 | Flag::Y as u8);
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if sum > 0xFFFF {
            f |= Flag::C as u8;
        }
        if (hl & 0x0FFF) + (operand & 0x0FFF) + carry as u16 > 0x0FFF {
            f |= Flag::H as u8;
        }
        if (!(hl ^ operand) & (hl ^ result) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        self.set_hl(result);
        self.f = f;
        self.delay(7);
    }

    /// SBC HL,rr (ED) — 15 T, full flag update. WZ = old HL + 1.
    pub(crate) fn op_sbc_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let hl = self.get_hl();
        let operand = self.get_rp(rp);
        let carry = (self.f & Flag::C as u8 != 0) as i32;
        self.wz = hl.wrapping_add(1);

        let diff = hl as i32 - operand as i32 - carry;
        let result = diff as u16;
        let mut f = Flag::N as u8
            | (((result >> 8) as u8) & (Flag::S as u8 | Flag::X as u8 | Flag::Y as u8));
        if result == 0 {
            f |= Flag::Z as u8;
        }
        if diff < 0 {
            f |= Flag::C as u8;
        }
        if (hl & 0x0FFF) as i32 - (operand & 0x0FFF) as i32 - carry < 0 {
            f |= Flag::H as u8;
        }
        if ((hl ^ operand) & (hl ^ result) & 0x8000) != 0 {
            f |= Flag::PV as u8;
        }
        self.set_hl(result);
        self.f = f;
        self.delay(7);
    }

    /// INC rr / DEC rr — 6 T, no flags
    /// Opcode mask: 00 rr0 011 / 00 rr1 011
    pub(crate) fn op_inc_dec_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let delta: u16 = if opcode & 0x08 != 0 { 0xFFFF } else { 1 };
        self.set_rp(rp, self.get_rp(rp).wrapping_add(delta));
        self.delay(2);
    }

    /// NEG (ED) — 8 T: A = 0 - A with full SUB flags
    pub(crate) fn op_neg(&mut self) {
        self.f = tables::SBC_FLAGS[self.a as usize];
        self.a = 0u8.wrapping_sub(self.a);
    }

    // --- Accumulator rotates: S, Z, PV preserved; X/Y from result ---

    /// RLCA — 4 T
    pub(crate) fn op_rlca(&mut self) {
        let carry = self.a >> 7;
        self.a = tables::ROL_OP_RESULTS[self.a as usize];
        self.f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8))
            | (self.a & (Flag::X as u8 | Flag::Y as u8))
            | carry;
    }

    /// RRCA — 4 T
    pub(crate) fn op_rrca(&mut self) {
        let carry = self.a & 0x01;
        self.a = tables::ROR_OP_RESULTS[self.a as usize];
        self.f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8))
            | (self.a & (Flag::X as u8 | Flag::Y as u8))
            | carry;
    }

    /// RLA — 4 T: rotate left through carry
    pub(crate) fn op_rla(&mut self) {
        let carry = self.a >> 7;
        self.a = (self.a << 1) | (self.f & Flag::C as u8);
        self.f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8))
            | (self.a & (Flag::X as u8 | Flag::Y as u8))
            | carry;
    }

    /// RRA — 4 T: rotate right through carry
    pub(crate) fn op_rra(&mut self) {
        let carry = self.a & 0x01;
        self.a = (self.a >> 1) | ((self.f & Flag::C as u8) << 7);
        self.f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8))
            | (self.a & (Flag::X as u8 | Flag::Y as u8))
            | carry;
    }

    /// DAA — 4 T: decimal adjust via the packed result table
    pub(crate) fn op_daa(&mut self) {
        let mut index = self.a as usize;
        if self.f & Flag::H as u8 != 0 {
            index |= 0x100;
        }
        if self.f & Flag::N as u8 != 0 {
            index |= 0x200;
        }
        if self.f & Flag::C as u8 != 0 {
            index |= 0x400;
        }
        let packed = tables::DAA_RESULTS[index];
        self.a = (packed >> 8) as u8;
        self.f = packed as u8;
    }

    /// CPL — 4 T: A inverted; H and N set; X/Y from the new A
    pub(crate) fn op_cpl(&mut self) {
        self.a = !self.a;
        self.f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8 | Flag::C as u8))
            | Flag::H as u8
            | Flag::N as u8
            | (self.a & (Flag::X as u8 | Flag::Y as u8));
    }

    /// SCF — 4 T: set carry; H and N cleared; X/Y from A
    pub(crate) fn op_scf(&mut self) {
        self.f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8))
            | (self.a & (Flag::X as u8 | Flag::Y as u8))
            | Flag::C as u8;
    }

    /// CCF — 4 T: invert carry; H takes the old carry; X/Y from A
    pub(crate) fn op_ccf(&mut self) {
        let old_carry = self.f & Flag::C as u8;
        let mut f = (self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8))
            | (self.a & (Flag::X as u8 | Flag::Y as u8));
        if old_carry != 0 {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        self.f = f;
    }
}
