//! CPU state snapshot types

use crate::cpu::z80::{IndexMode, PrefixMode};

/// Z80 CPU state snapshot.
///
/// Field-for-field image of the architectural and control state, used for
/// serialization and by test harnesses that diff whole-CPU states. The tact
/// counter is split into two 32-bit halves so the layout stays stable across
/// hosts without 64-bit integers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Z80State {
    pub a: u8,       // Accumulator
    pub f: u8,       // Flags register
    pub b: u8,       // Register B
    pub c: u8,       // Register C
    pub d: u8,       // Register D
    pub e: u8,       // Register E
    pub h: u8,       // Register H
    pub l: u8,       // Register L
    pub a_prime: u8, // Shadow accumulator
    pub f_prime: u8, // Shadow flags
    pub b_prime: u8, // Shadow B
    pub c_prime: u8, // Shadow C
    pub d_prime: u8, // Shadow D
    pub e_prime: u8, // Shadow E
    pub h_prime: u8, // Shadow H
    pub l_prime: u8, // Shadow L
    pub i: u8,       // Interrupt vector register
    pub r: u8,       // Memory refresh register
    pub pc: u16,     // Program counter
    pub sp: u16,     // Stack pointer
    pub ix: u16,     // Index register X
    pub iy: u16,     // Index register Y
    pub wz: u16,     // Hidden WZ (MEMPTR) register
    pub tacts_l: u32,
    pub tacts_h: u32,
    pub state_flags: u8, // Pending INT/NMI/RESET/HALTED signal bits
    pub iff1: bool,
    pub iff2: bool,
    pub interrupt_mode: u8,
    pub is_interrupt_blocked: bool,
    pub is_in_op_execution: bool,
    pub prefix_mode: PrefixMode,
    pub index_mode: IndexMode,
    pub maskable_interrupt_mode_entered: bool,
    pub op_code: u8,
    pub use_gate_array_contention: bool,
}
