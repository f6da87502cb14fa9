use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80, tables};

impl Z80 {
    /// Perform a CB rotate/shift and set F from the precomputed tables.
    /// op: 0=RLC, 1=RRC, 2=RL, 3=RR, 4=SLA, 5=SRA, 6=SLL(undoc), 7=SRL.
    /// SLA/SLL/SRL share the RL/RR flag tables: same shifted result, same C.
    pub(crate) fn rotate_shift(&mut self, op: u8, value: u8) -> u8 {
        let carry_in = self.f & Flag::C as u8 != 0;
        let (result, flags) = match op {
            0 => (
                tables::ROL_OP_RESULTS[value as usize],
                tables::RLC_FLAGS[value as usize],
            ),
            1 => (
                tables::ROR_OP_RESULTS[value as usize],
                tables::RRC_FLAGS[value as usize],
            ),
            2 if carry_in => ((value << 1) | 0x01, tables::RL_CARRY1_FLAGS[value as usize]),
            2 => (value << 1, tables::RL_CARRY0_FLAGS[value as usize]),
            3 if carry_in => ((value >> 1) | 0x80, tables::RR_CARRY1_FLAGS[value as usize]),
            3 => (value >> 1, tables::RR_CARRY0_FLAGS[value as usize]),
            4 => (value << 1, tables::RL_CARRY0_FLAGS[value as usize]),
            5 => (
                (value >> 1) | (value & 0x80),
                tables::SRA_FLAGS[value as usize],
            ),
            6 => ((value << 1) | 0x01, tables::RL_CARRY1_FLAGS[value as usize]),
            7 => (value >> 1, tables::RR_CARRY0_FLAGS[value as usize]),
            _ => unreachable!(),
        };
        self.f = flags;
        result
    }

    /// BIT b flag outcome. Z (and PV, its copy) from the tested bit, H set,
    /// N cleared, C preserved, S only for a set bit 7. X/Y come from
    /// `xy_source`: the operand for the register form, the high byte of WZ
    /// for (HL), the high byte of the effective address for (IX+d).
    fn apply_bit_flags(&mut self, bit: u8, value: u8, xy_source: u8) {
        let tested = value & (1 << bit);
        let mut f = (self.f & Flag::C as u8) | Flag::H as u8;
        if tested == 0 {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if bit == 7 && tested != 0 {
            f |= Flag::S as u8;
        }
        f |= xy_source & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// Execute a CB-prefixed operation (no index prefix in effect).
    /// Register forms: 8 T. BIT b,(HL): 12 T. Rotate/RES/SET (HL): 15 T.
    pub(crate) fn dispatch_bit<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let opcode = self.op_code;
        let group = (opcode >> 6) & 0x03; // 0=rot/shift, 1=BIT, 2=RES, 3=SET
        let yyy = (opcode >> 3) & 0x07; // bit number or shift operation
        let zzz = opcode & 0x07; // register index

        if zzz == 6 {
            let addr = self.get_hl();
            let value = self.read_mem(bus, addr);
            self.delay(1);
            match group {
                1 => {
                    let wz_high = (self.wz >> 8) as u8;
                    self.apply_bit_flags(yyy, value, wz_high);
                }
                _ => {
                    let result = match group {
                        0 => self.rotate_shift(yyy, value),
                        2 => value & !(1 << yyy),
                        _ => value | (1 << yyy),
                    };
                    self.write_mem(bus, addr, result);
                }
            }
        } else {
            let value = self.get_reg8(zzz);
            match group {
                0 => {
                    let result = self.rotate_shift(yyy, value);
                    self.set_reg8(zzz, result);
                }
                1 => self.apply_bit_flags(yyy, value, value),
                2 => self.set_reg8(zzz, value & !(1 << yyy)),
                _ => self.set_reg8(zzz, value | (1 << yyy)),
            }
        }
    }

    /// Execute a DD CB d op / FD CB d op operation. The effective address
    /// was latched into WZ when the displacement was consumed.
    /// BIT b,(IX+d): 20 T. Rotate/RES/SET (IX+d): 23 T, and when the low
    /// three opcode bits name a register the result is also copied there
    /// (the undocumented store-back).
    pub(crate) fn dispatch_indexed_bit<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let opcode = self.op_code;
        let group = (opcode >> 6) & 0x03;
        let yyy = (opcode >> 3) & 0x07;
        let zzz = opcode & 0x07;
        let addr = self.wz;

        let value = self.read_mem(bus, addr);
        self.delay(1);
        if group == 1 {
            let addr_high = (addr >> 8) as u8;
            self.apply_bit_flags(yyy, value, addr_high);
        } else {
            let result = match group {
                0 => self.rotate_shift(yyy, value),
                2 => value & !(1 << yyy),
                _ => value | (1 << yyy),
            };
            if zzz != 6 {
                // Store-back targets the plain register set, never IXH/IXL
                self.set_reg8(zzz, result);
            }
            self.write_mem(bus, addr, result);
        }
    }
}
