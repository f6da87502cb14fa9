//! Precomputed ALU flag tables.
//!
//! Populated once at first use from the closed-form flag rules so the
//! execution hot path computes flags with a single lookup. The ADC/SBC
//! tables cover every (carry-in, accumulator, operand) triple and are the
//! only boxed ones (128 KiB each).

use lazy_static::lazy_static;

use crate::cpu::z80::Flag;

const FLAG_53: u8 = Flag::Y as u8 | Flag::X as u8;

/// S, Z and the undocumented bit-5/bit-3 copies for a result byte.
fn sz53(value: u8) -> u8 {
    let mut f = value & (Flag::S as u8 | FLAG_53);
    if value == 0 {
        f |= Flag::Z as u8;
    }
    f
}

fn parity(value: u8) -> u8 {
    if value.count_ones() % 2 == 0 {
        Flag::PV as u8
    } else {
        0
    }
}

lazy_static! {
    /// F after `INC r8`, indexed by the pre-increment value.
    /// C stays zero in the entry; INC preserves it, so the caller ORs it in.
    pub static ref INC_OP_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = value.wrapping_add(1);
            let mut f = sz53(result);
            if value & 0x0F == 0x0F {
                f |= Flag::H as u8;
            }
            if value == 0x7F {
                f |= Flag::PV as u8;
            }
            table[value as usize] = f;
        }
        table
    };

    /// F after `DEC r8`, indexed by the pre-decrement value. C left to caller.
    pub static ref DEC_OP_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = value.wrapping_sub(1);
            let mut f = sz53(result) | Flag::N as u8;
            if value & 0x0F == 0x00 {
                f |= Flag::H as u8;
            }
            if value == 0x80 {
                f |= Flag::PV as u8;
            }
            table[value as usize] = f;
        }
        table
    };

    /// Packed `(new_A << 8) | new_F` for DAA, indexed by
    /// `(C << 10) | (N << 9) | (H << 8) | A`.
    pub static ref DAA_RESULTS: [u16; 2048] = {
        let mut table = [0u16; 2048];
        for index in 0..2048usize {
            let a = (index & 0xFF) as u8;
            let h = (index >> 8) & 1;
            let n = (index >> 9) & 1;
            let c = (index >> 10) & 1;

            let low = a & 0x0F;
            let mut diff = 0u8;
            if h != 0 || low > 9 {
                diff |= 0x06;
            }
            let mut carry = c != 0;
            if c != 0 || a > 0x99 {
                diff |= 0x60;
                carry = true;
            }
            let result = if n != 0 {
                a.wrapping_sub(diff)
            } else {
                a.wrapping_add(diff)
            };

            let mut f = sz53(result) | parity(result);
            let half = if n == 0 { low > 9 } else { h != 0 && low < 6 };
            if half {
                f |= Flag::H as u8;
            }
            if n != 0 {
                f |= Flag::N as u8;
            }
            if carry {
                f |= Flag::C as u8;
            }
            table[index] = ((result as u16) << 8) | f as u16;
        }
        table
    };

    /// F after ADC, indexed by `(carry_in << 16) | (A << 8) | operand`.
    /// ADD is the carry_in = 0 half.
    pub static ref ADC_FLAGS: Box<[u8]> = {
        let mut table = vec![0u8; 0x20000];
        for index in 0..0x20000usize {
            let carry = (index >> 16) as u8;
            let a = ((index >> 8) & 0xFF) as u8;
            let operand = (index & 0xFF) as u8;

            let sum = a as u16 + operand as u16 + carry as u16;
            let result = sum as u8;
            let mut f = sz53(result);
            if sum > 0xFF {
                f |= Flag::C as u8;
            }
            if (a & 0x0F) + (operand & 0x0F) + carry > 0x0F {
                f |= Flag::H as u8;
            }
            if (!(a ^ operand) & (a ^ result) & 0x80) != 0 {
                f |= Flag::PV as u8;
            }
            table[index] = f;
        }
        table.into_boxed_slice()
    };

    /// F after SBC, indexed by `(carry_in << 16) | (A << 8) | operand`.
    /// SUB and CP are the carry_in = 0 half.
    pub static ref SBC_FLAGS: Box<[u8]> = {
        let mut table = vec![0u8; 0x20000];
        for index in 0..0x20000usize {
            let carry = (index >> 16) as i32;
            let a = ((index >> 8) & 0xFF) as u8;
            let operand = (index & 0xFF) as u8;

            let diff = a as i32 - operand as i32 - carry;
            let result = diff as u8;
            let mut f = sz53(result) | Flag::N as u8;
            if diff < 0 {
                f |= Flag::C as u8;
            }
            if (a & 0x0F) as i32 - (operand & 0x0F) as i32 - carry < 0 {
                f |= Flag::H as u8;
            }
            if ((a ^ operand) & (a ^ result) & 0x80) != 0 {
                f |= Flag::PV as u8;
            }
            table[index] = f;
        }
        table.into_boxed_slice()
    };

    /// F after AND/OR/XOR, indexed by the result byte. H=N=C=0, P/V=parity;
    /// the AND call site ORs H in.
    pub static ref ALU_LOG_OP_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            table[value as usize] = sz53(value) | parity(value);
        }
        table
    };

    /// F after RLC, indexed by the input byte.
    pub static ref RLC_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = value.rotate_left(1);
            table[value as usize] = sz53(result) | parity(result) | (value >> 7);
        }
        table
    };

    /// F after RRC, indexed by the input byte.
    pub static ref RRC_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = value.rotate_right(1);
            table[value as usize] = sz53(result) | parity(result) | (value & 0x01);
        }
        table
    };

    /// F after RL with incoming carry 0. Also the SLA flag table: the shifted
    /// result is identical.
    pub static ref RL_CARRY0_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = value << 1;
            table[value as usize] = sz53(result) | parity(result) | (value >> 7);
        }
        table
    };

    /// F after RL with incoming carry 1. Also the SLL flag table.
    pub static ref RL_CARRY1_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = (value << 1) | 0x01;
            table[value as usize] = sz53(result) | parity(result) | (value >> 7);
        }
        table
    };

    /// F after RR with incoming carry 0. Also the SRL flag table.
    pub static ref RR_CARRY0_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = value >> 1;
            table[value as usize] = sz53(result) | parity(result) | (value & 0x01);
        }
        table
    };

    /// F after RR with incoming carry 1.
    pub static ref RR_CARRY1_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = (value >> 1) | 0x80;
            table[value as usize] = sz53(result) | parity(result) | (value & 0x01);
        }
        table
    };

    /// F after SRA (sign-preserving right shift), indexed by the input byte.
    pub static ref SRA_FLAGS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            let result = (value >> 1) | (value & 0x80);
            table[value as usize] = sz53(result) | parity(result) | (value & 0x01);
        }
        table
    };

    /// Byte rotated left by one (RLC/RLCA result values).
    pub static ref ROL_OP_RESULTS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            table[value as usize] = value.rotate_left(1);
        }
        table
    };

    /// Byte rotated right by one (RRC/RRCA result values).
    pub static ref ROR_OP_RESULTS: [u8; 256] = {
        let mut table = [0u8; 256];
        for value in 0..=255u8 {
            table[value as usize] = value.rotate_right(1);
        }
        table
    };
}
