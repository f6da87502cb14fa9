mod alu;
mod bit;
mod block;
mod branch;
mod extended;
mod load_store;
mod memory_status;
mod stack;
pub mod tables;

pub use memory_status::MemoryStatusMap;

use crate::core::Bus;
use crate::cpu::state::Z80State;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

/// Signal request bits in `state_flags`. The host raises them; the
/// dispatcher services at most one per cycle.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    Int = 0x01,
    Nmi = 0x02,
    Reset = 0x04,
    Halted = 0x08,
}

/// Decode-table selector carried across cycles while a multi-byte opcode is
/// in progress.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrefixMode {
    #[default]
    None = 0,
    Extended = 1,
    Bit = 2,
}

/// Index-register override established by a DD/FD prefix (last one wins).
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexMode {
    #[default]
    None = 0,
    Ix = 1,
    Iy = 2,
}

pub struct Z80 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,
    pub wz: u16, // Hidden MEMPTR register

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    pub interrupt_mode: u8,
    pub maskable_interrupt_mode_entered: bool,

    // Signal requests and the prefix state machine
    pub state_flags: u8,
    pub prefix_mode: PrefixMode,
    pub index_mode: IndexMode,
    pub is_interrupt_blocked: bool,
    pub is_in_op_execution: bool,
    pub op_code: u8,

    // Tact ledger
    pub tacts: u64,

    // Configuration
    pub allow_extended_instruction_set: bool,
    pub use_gate_array_contention: bool,

    // Per-address touch instrumentation for the test harness
    pub execution_flow_status: MemoryStatusMap,
    pub memory_read_status: MemoryStatusMap,
    pub memory_write_status: MemoryStatusMap,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Z80 {
    /// Construct a CPU in its power-on state: every register all-ones,
    /// control state zeroed. Callers follow up with `reset()` before the
    /// first `execute_cpu_cycle` call.
    pub fn new(allow_extended_instruction_set: bool) -> Self {
        let mut cpu = Self {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_prime: 0,
            f_prime: 0,
            b_prime: 0,
            c_prime: 0,
            d_prime: 0,
            e_prime: 0,
            h_prime: 0,
            l_prime: 0,
            ix: 0,
            iy: 0,
            i: 0,
            r: 0,
            sp: 0,
            pc: 0,
            wz: 0,
            iff1: false,
            iff2: false,
            interrupt_mode: 0,
            maskable_interrupt_mode_entered: false,
            state_flags: 0,
            prefix_mode: PrefixMode::None,
            index_mode: IndexMode::None,
            is_interrupt_blocked: false,
            is_in_op_execution: false,
            op_code: 0,
            tacts: 0,
            allow_extended_instruction_set,
            use_gate_array_contention: false,
            execution_flow_status: MemoryStatusMap::new(),
            memory_read_status: MemoryStatusMap::new(),
            memory_write_status: MemoryStatusMap::new(),
        };
        cpu.turn_on();
        cpu
    }

    /// Re-apply the power-on register pattern (all-ones). Control state is
    /// left alone, matching hardware where VCC ramp-up scrambles only the
    /// register file.
    pub fn turn_on(&mut self) {
        self.a = 0xFF;
        self.f = 0xFF;
        self.b = 0xFF;
        self.c = 0xFF;
        self.d = 0xFF;
        self.e = 0xFF;
        self.h = 0xFF;
        self.l = 0xFF;
        self.a_prime = 0xFF;
        self.f_prime = 0xFF;
        self.b_prime = 0xFF;
        self.c_prime = 0xFF;
        self.d_prime = 0xFF;
        self.e_prime = 0xFF;
        self.h_prime = 0xFF;
        self.l_prime = 0xFF;
        self.ix = 0xFFFF;
        self.iy = 0xFFFF;
        self.i = 0xFF;
        self.r = 0xFF;
        self.sp = 0xFFFF;
        self.pc = 0xFFFF;
        self.wz = 0xFFFF;
    }

    /// The RESET protocol: clear PC, I, R, the interrupt latches and mode,
    /// any pending prefix state, all signal requests and the tact counter.
    pub fn reset(&mut self) {
        self.pc = 0x0000;
        self.i = 0;
        self.r = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.interrupt_mode = 0;
        self.maskable_interrupt_mode_entered = false;
        self.prefix_mode = PrefixMode::None;
        self.index_mode = IndexMode::None;
        self.is_interrupt_blocked = false;
        self.is_in_op_execution = false;
        self.state_flags = 0;
        self.tacts = 0;
    }

    pub fn set_signal(&mut self, signal: Signal) {
        self.state_flags |= signal as u8;
    }

    pub fn remove_signal(&mut self, signal: Signal) {
        self.state_flags &= !(signal as u8);
    }

    pub fn is_halted(&self) -> bool {
        self.state_flags & Signal::Halted as u8 != 0
    }

    /// Clear the execution-flow, read and write touch maps.
    pub fn reset_memory_status(&mut self) {
        self.execution_flow_status.clear();
        self.memory_read_status.clear();
        self.memory_write_status.clear();
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    pub fn get_af(&self) -> u16 { ((self.a as u16) << 8) | self.f as u16 }
    pub fn set_af(&mut self, val: u16) { self.a = (val >> 8) as u8; self.f = val as u8; }

    /// Get an 8-bit register by its 3-bit operation code (0=B, 1=C, 2=D,
    /// 3=E, 4=H, 5=L, 7=A). Code 6 addresses the (HL) indirection and has no
    /// register behind it; it and out-of-range codes return the 0xFF
    /// sentinel.
    pub fn get_reg8(&self, code: u8) -> u8 {
        match code {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => {
                log::warn!("get_reg8: invalid register code {code}");
                0xFF
            }
        }
    }

    /// Set an 8-bit register by operation code. Code 6 and out-of-range
    /// codes are no-ops.
    pub fn set_reg8(&mut self, code: u8, val: u8) {
        match code {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => log::warn!("set_reg8: invalid register code {code}"),
        }
    }

    /// Get a 16-bit register pair by its 2-bit code (0=BC, 1=DE, 2=HL,
    /// 3=SP). Invalid codes return the 0xFFFF sentinel.
    pub fn get_reg16(&self, code: u8) -> u16 {
        match code {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.get_hl(),
            3 => self.sp,
            _ => {
                log::warn!("get_reg16: invalid register code {code}");
                0xFFFF
            }
        }
    }

    /// Set a 16-bit register pair by code. Invalid codes are no-ops.
    pub fn set_reg16(&mut self, code: u8, val: u16) {
        match code {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => self.set_hl(val),
            3 => self.sp = val,
            _ => log::warn!("set_reg16: invalid register code {code}"),
        }
    }

    /// Get 8-bit register by index, respecting IX/IY prefix for H/L (the
    /// undocumented IXH/IXL/IYH/IYL registers).
    /// Index 6 is NOT handled here — callers handle (HL)/(IX+d)/(IY+d).
    pub fn get_reg8_ix(&self, index: u8) -> u8 {
        match (index, self.index_mode) {
            (4, IndexMode::Ix) => (self.ix >> 8) as u8,
            (5, IndexMode::Ix) => self.ix as u8,
            (4, IndexMode::Iy) => (self.iy >> 8) as u8,
            (5, IndexMode::Iy) => self.iy as u8,
            _ => self.get_reg8(index),
        }
    }

    pub fn set_reg8_ix(&mut self, index: u8, val: u8) {
        match (index, self.index_mode) {
            (4, IndexMode::Ix) => self.ix = (self.ix & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::Ix) => self.ix = (self.ix & 0xFF00) | val as u16,
            (4, IndexMode::Iy) => self.iy = (self.iy & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::Iy) => self.iy = (self.iy & 0xFF00) | val as u16,
            _ => self.set_reg8(index, val),
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    /// Index 2 respects the current index_mode for DD/FD prefixed
    /// instructions.
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => match self.index_mode {
                IndexMode::None => self.get_hl(),
                IndexMode::Ix => self.ix,
                IndexMode::Iy => self.iy,
            },
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    /// Set 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => match self.index_mode {
                IndexMode::None => self.set_hl(val),
                IndexMode::Ix => self.ix = val,
                IndexMode::Iy => self.iy = val,
            },
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    /// Get 16-bit register pair by index for PUSH/POP (0=BC, 1=DE,
    /// 2=HL/IX/IY, 3=AF).
    pub(crate) fn get_rp_af(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => match self.index_mode {
                IndexMode::None => self.get_hl(),
                IndexMode::Ix => self.ix,
                IndexMode::Iy => self.iy,
            },
            3 => self.get_af(),
            _ => unreachable!("get_rp_af called with index {}", index),
        }
    }

    /// Set 16-bit register pair by index for PUSH/POP (0=BC, 1=DE,
    /// 2=HL/IX/IY, 3=AF).
    pub(crate) fn set_rp_af(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => match self.index_mode {
                IndexMode::None => self.set_hl(val),
                IndexMode::Ix => self.ix = val,
                IndexMode::Iy => self.iy = val,
            },
            3 => self.set_af(val),
            _ => unreachable!("set_rp_af called with index {}", index),
        }
    }

    // --- Tact ledger: every bus touch goes through these ---

    /// Add internal (idle) tacts.
    pub fn delay(&mut self, tacts: u64) {
        self.tacts += tacts;
    }

    fn contend<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        if self.use_gate_array_contention {
            self.tacts += bus.contention(addr);
        }
    }

    /// Memory read: 3 T plus host contention; marks the read touch map.
    pub(crate) fn read_mem<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.contend(bus, addr);
        let data = bus.read_memory(addr);
        self.tacts += 3;
        self.memory_read_status.touch(addr);
        data
    }

    /// Memory write: 3 T plus host contention; marks the write touch map.
    pub(crate) fn write_mem<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, data: u8) {
        self.contend(bus, addr);
        bus.write_memory(addr, data);
        self.tacts += 3;
        self.memory_write_status.touch(addr);
    }

    /// Port read: 4 T plus host contention.
    pub(crate) fn read_io<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.contend(bus, addr);
        let data = bus.read_port(addr);
        self.tacts += 4;
        data
    }

    /// Port write: 4 T plus host contention.
    pub(crate) fn write_io<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, data: u8) {
        self.contend(bus, addr);
        bus.write_port(addr, data);
        self.tacts += 4;
    }

    /// Read the next code-stream byte (3 T); marks the execution-flow map.
    /// No refresh: this is the operand/displacement form of a code read.
    pub(crate) fn read_code<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        self.contend(bus, self.pc);
        let data = bus.read_memory(self.pc);
        self.tacts += 3;
        self.execution_flow_status.touch(self.pc);
        self.pc = self.pc.wrapping_add(1);
        data
    }

    /// M1 opcode fetch: code read + 1 internal T + R refresh (4 T total).
    pub(crate) fn fetch_m1<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let opcode = self.read_code(bus);
        self.delay(1);
        self.refresh_memory();
        opcode
    }

    /// Increment R, preserving its top bit.
    pub(crate) fn refresh_memory(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// Effective address of the (HL)/(IX+d)/(IY+d) operand. Index modes read
    /// the signed displacement from the code stream, spend `internal_tacts`
    /// on the address calculation and latch the result into WZ.
    pub(crate) fn effective_addr<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        internal_tacts: u64,
    ) -> u16 {
        match self.index_mode {
            IndexMode::None => self.get_hl(),
            IndexMode::Ix => {
                let d = self.read_code(bus) as i8;
                self.delay(internal_tacts);
                self.wz = self.ix.wrapping_add(d as i16 as u16);
                self.wz
            }
            IndexMode::Iy => {
                let d = self.read_code(bus) as i8;
                self.delay(internal_tacts);
                self.wz = self.iy.wrapping_add(d as i16 as u16);
                self.wz
            }
        }
    }

    // --- Dispatcher ---

    /// Advance the CPU by one unit of work: a pending signal service, a
    /// prefix byte, or a complete (remaining) instruction. The prefix state
    /// machine persists across calls, so a host stepping one call at a time
    /// observes mid-instruction state through `is_in_op_execution`,
    /// `prefix_mode` and `index_mode`.
    pub fn execute_cpu_cycle<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.maskable_interrupt_mode_entered = false;
        if self.state_flags != 0 && self.process_signals(bus) {
            return;
        }

        if self.prefix_mode == PrefixMode::Bit && self.index_mode != IndexMode::None {
            // DDCB/FDCB: the displacement byte arrives before the operation
            // byte, and neither read refreshes R.
            let d = self.read_code(bus) as i8;
            let base = if self.index_mode == IndexMode::Ix { self.ix } else { self.iy };
            self.wz = base.wrapping_add(d as i16 as u16);
            self.op_code = self.read_code(bus);
            self.delay(2);
            self.dispatch_indexed_bit(bus);
            self.end_operation();
            return;
        }

        self.op_code = self.fetch_m1(bus);
        match self.prefix_mode {
            PrefixMode::Extended => {
                self.dispatch_extended(bus);
                self.end_operation();
            }
            PrefixMode::Bit => {
                self.dispatch_bit(bus);
                self.end_operation();
            }
            PrefixMode::None => match self.op_code {
                0xCB => {
                    self.prefix_mode = PrefixMode::Bit;
                    self.is_in_op_execution = true;
                }
                0xED => {
                    self.prefix_mode = PrefixMode::Extended;
                    self.index_mode = IndexMode::None;
                    self.is_in_op_execution = true;
                }
                0xDD => {
                    self.index_mode = IndexMode::Ix;
                    self.is_interrupt_blocked = true;
                    self.is_in_op_execution = true;
                }
                0xFD => {
                    self.index_mode = IndexMode::Iy;
                    self.is_interrupt_blocked = true;
                    self.is_in_op_execution = true;
                }
                opcode => {
                    self.dispatch_standard(opcode, bus);
                    self.end_operation();
                }
            },
        }
    }

    /// Terminal-instruction bookkeeping: drop the prefix state and release
    /// the interrupt block — except after EI/DI, whose block survives one
    /// more instruction (the EI delay).
    fn end_operation(&mut self) {
        if !(self.prefix_mode == PrefixMode::None && matches!(self.op_code, 0xF3 | 0xFB)) {
            self.is_interrupt_blocked = false;
        }
        self.prefix_mode = PrefixMode::None;
        self.index_mode = IndexMode::None;
        self.is_in_op_execution = false;
    }

    /// Service pending signals. Priority: serviceable INT, RESET, NMI, then
    /// the HALT idle cycle. Returns true when a signal consumed this call.
    fn process_signals<B: Bus + ?Sized>(&mut self, bus: &mut B) -> bool {
        if self.state_flags & Signal::Int as u8 != 0
            && self.iff1
            && !self.is_interrupt_blocked
            && !self.is_in_op_execution
        {
            self.execute_interrupt(bus);
            return true;
        }
        if self.state_flags & Signal::Reset as u8 != 0 {
            self.reset();
            return true;
        }
        if self.state_flags & Signal::Nmi as u8 != 0 && !self.is_in_op_execution {
            self.execute_nmi(bus);
            return true;
        }
        if self.state_flags & Signal::Halted as u8 != 0 {
            // HALTed with nothing serviceable: burn one refresh M-cycle.
            self.delay(4);
            self.refresh_memory();
            return true;
        }
        false
    }

    /// Maskable interrupt acknowledge.
    /// IM 0 is treated as a bus driving RST 38h: 13 T, same as IM 1.
    /// IM 2 fetches a little-endian vector from (I << 8) | bus byte: 19 T.
    fn execute_interrupt<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if self.state_flags & Signal::Halted as u8 != 0 {
            self.state_flags &= !(Signal::Halted as u8);
            self.pc = self.pc.wrapping_add(1);
        }
        self.iff1 = false;
        self.iff2 = false;
        self.refresh_memory();
        self.delay(7);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, (self.pc >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, self.pc as u8);
        if self.interrupt_mode == 2 {
            let vector_addr = ((self.i as u16) << 8) | bus.interrupt_vector() as u16;
            let low = self.read_mem(bus, vector_addr);
            let high = self.read_mem(bus, vector_addr.wrapping_add(1));
            self.wz = ((high as u16) << 8) | low as u16;
        } else {
            self.wz = 0x0038;
        }
        self.pc = self.wz;
        self.maskable_interrupt_mode_entered = true;
    }

    /// Non-maskable interrupt: 11 T. IFF2 latches the pre-NMI IFF1 so RETN
    /// can restore it. The NMI request is consumed.
    fn execute_nmi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if self.state_flags & Signal::Halted as u8 != 0 {
            self.state_flags &= !(Signal::Halted as u8);
            self.pc = self.pc.wrapping_add(1);
        }
        self.iff2 = self.iff1;
        self.iff1 = false;
        self.refresh_memory();
        self.delay(5);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, (self.pc >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        self.write_mem(bus, self.sp, self.pc as u8);
        self.pc = 0x0066;
        self.wz = self.pc;
        self.state_flags &= !(Signal::Nmi as u8);
    }

    /// Dispatch an unprefixed (or DD/FD-rewritten) opcode.
    fn dispatch_standard<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        match opcode {
            // NOP — 4 T: M1 only
            0x00 => {}

            // HALT — 4 T. PC steps back onto the HALT so the CPU idles there
            // until an interrupt; the acknowledge advances PC past it.
            0x76 => {
                self.state_flags |= Signal::Halted as u8;
                self.pc = self.pc.wrapping_sub(1);
            }

            // --- Load/Store ---

            // LD (BC), A — 7 T
            0x02 => self.op_ld_bc_a(bus),
            // LD (DE), A — 7 T
            0x12 => self.op_ld_de_a(bus),
            // LD (nn), HL — 16 T
            0x22 => self.op_ld_nn_hl(bus),
            // LD (nn), A — 13 T
            0x32 => self.op_ld_nn_a(bus),

            // EX AF, AF' — 4 T
            0x08 => self.op_ex_af_af(),

            // LD A, (BC) — 7 T
            0x0A => self.op_ld_a_bc(bus),
            // LD A, (DE) — 7 T
            0x1A => self.op_ld_a_de(bus),
            // LD HL, (nn) — 16 T
            0x2A => self.op_ld_hl_nn_ind(bus),
            // LD A, (nn) — 13 T
            0x3A => self.op_ld_a_nn(bus),

            // LD SP, HL — 6 T
            0xF9 => self.op_ld_sp_hl(),

            // EX DE, HL — 4 T
            0xEB => self.op_ex_de_hl(),
            // EXX — 4 T
            0xD9 => self.op_exx(),
            // EX (SP), HL — 19 T
            0xE3 => self.op_ex_sp_hl(bus),

            // --- Branch/Control Flow ---

            // JP nn — 10 T
            0xC3 => self.op_jp_nn(bus),
            // JP (HL) — 4 T
            0xE9 => self.op_jp_hl(),
            // JR e — 12 T
            0x18 => self.op_jr_e(bus),
            // DJNZ e — 13/8 T
            0x10 => self.op_djnz(bus),
            // CALL nn — 17 T
            0xCD => self.op_call_nn(bus),
            // RET — 10 T
            0xC9 => self.op_ret(bus),
            // IN A,(n) — 11 T
            0xDB => self.op_in_a_n(bus),
            // OUT (n),A — 11 T
            0xD3 => self.op_out_n_a(bus),

            // DI — 4 T
            0xF3 => self.op_di(),
            // EI — 4 T
            0xFB => self.op_ei(),

            // Accumulator rotates — 4 T
            0x07 => self.op_rlca(),
            0x0F => self.op_rrca(),
            0x17 => self.op_rla(),
            0x1F => self.op_rra(),

            // Misc ALU — 4 T
            0x27 => self.op_daa(),
            0x2F => self.op_cpl(),
            0x37 => self.op_scf(),
            0x3F => self.op_ccf(),

            // LD rr, nn (0x01/0x11/0x21/0x31) — 10 T
            op if (op & 0xCF) == 0x01 => self.op_ld_rr_nn(op, bus),

            // LD r, n (0x06, 0x0E, ... 0x3E) — 7 T: M1 + MR
            op if (op & 0xC7) == 0x06 => self.op_ld_r_n(op, bus),

            // LD r, r' (0x40-0x7F excluding 0x76) — 4/7 T
            op if (op & 0xC0) == 0x40 => self.op_ld_r_r(op, bus),

            // PUSH rr (0xC5/D5/E5/F5) — 11 T
            op if (op & 0xCF) == 0xC5 => self.op_push(op, bus),
            // POP rr (0xC1/D1/E1/F1) — 10 T
            op if (op & 0xCF) == 0xC1 => self.op_pop(op, bus),

            // ALU A, r (0x80 - 0xBF) — 4 T (reg) or 7 T ((HL))
            op if (op & 0xC0) == 0x80 => self.op_alu_r(op, bus),
            // ALU A, n (0xC6, 0xCE, ... 0xFE) — 7 T: M1 + MR
            op if (op & 0xC7) == 0xC6 => self.op_alu_n(op, bus),

            // INC r (0x04, 0x0C...) — 4 T (reg) or 11 T ((HL))
            op if (op & 0xC7) == 0x04 => self.op_inc_dec_r(op, bus),
            // DEC r (0x05, 0x0D...) — 4 T (reg) or 11 T ((HL))
            op if (op & 0xC7) == 0x05 => self.op_inc_dec_r(op, bus),

            // ADD HL,rr (0x09/0x19/0x29/0x39) — 11 T
            op if (op & 0xCF) == 0x09 => self.op_add_hl_rr(op),
            // INC rr (0x03/0x13/0x23/0x33) — 6 T
            op if (op & 0xCF) == 0x03 => self.op_inc_dec_rr(op),
            // DEC rr (0x0B/0x1B/0x2B/0x3B) — 6 T
            op if (op & 0xCF) == 0x0B => self.op_inc_dec_rr(op),

            // JP cc,nn — 10 T
            op if (op & 0xC7) == 0xC2 => self.op_jp_cc_nn(op, bus),
            // JR cc,e — 12/7 T (NZ/Z/NC/C only)
            op if (op & 0xE7) == 0x20 => self.op_jr_cc_e(op, bus),
            // CALL cc,nn — 17/10 T
            op if (op & 0xC7) == 0xC4 => self.op_call_cc_nn(op, bus),
            // RET cc — 11/5 T
            op if (op & 0xC7) == 0xC0 => self.op_ret_cc(op, bus),
            // RST p — 11 T
            op if (op & 0xC7) == 0xC7 => self.op_rst(op, bus),

            _ => {}
        }
    }

    /// Classify the instruction at `addr` for a step-over debugger: 3 for
    /// CALL/CALL cc, 1 for RST and HALT, 2 for the self-repeating ED block
    /// ops, 0 for everything else. Reads through the bus without touching
    /// the tact ledger.
    pub fn get_call_instruction_length<B: Bus + ?Sized>(&self, bus: &mut B, addr: u16) -> u8 {
        let opcode = bus.read_memory(addr);
        match opcode {
            0xCD => 3,
            0x76 => 1,
            0xED => match bus.read_memory(addr.wrapping_add(1)) {
                0xB0 | 0xB1 | 0xB2 | 0xB3 | 0xB8 | 0xB9 | 0xBA | 0xBB => 2,
                _ => 0,
            },
            op if (op & 0xC7) == 0xC4 => 3,
            op if (op & 0xC7) == 0xC7 => 1,
            _ => 0,
        }
    }

    // --- Snapshot ---

    pub fn get_state(&self) -> Z80State {
        Z80State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            a_prime: self.a_prime,
            f_prime: self.f_prime,
            b_prime: self.b_prime,
            c_prime: self.c_prime,
            d_prime: self.d_prime,
            e_prime: self.e_prime,
            h_prime: self.h_prime,
            l_prime: self.l_prime,
            i: self.i,
            r: self.r,
            pc: self.pc,
            sp: self.sp,
            ix: self.ix,
            iy: self.iy,
            wz: self.wz,
            tacts_l: self.tacts as u32,
            tacts_h: (self.tacts >> 32) as u32,
            state_flags: self.state_flags,
            iff1: self.iff1,
            iff2: self.iff2,
            interrupt_mode: self.interrupt_mode,
            is_interrupt_blocked: self.is_interrupt_blocked,
            is_in_op_execution: self.is_in_op_execution,
            prefix_mode: self.prefix_mode,
            index_mode: self.index_mode,
            maskable_interrupt_mode_entered: self.maskable_interrupt_mode_entered,
            op_code: self.op_code,
            use_gate_array_contention: self.use_gate_array_contention,
        }
    }

    pub fn update_state(&mut self, state: &Z80State) {
        self.a = state.a;
        self.f = state.f;
        self.b = state.b;
        self.c = state.c;
        self.d = state.d;
        self.e = state.e;
        self.h = state.h;
        self.l = state.l;
        self.a_prime = state.a_prime;
        self.f_prime = state.f_prime;
        self.b_prime = state.b_prime;
        self.c_prime = state.c_prime;
        self.d_prime = state.d_prime;
        self.e_prime = state.e_prime;
        self.h_prime = state.h_prime;
        self.l_prime = state.l_prime;
        self.i = state.i;
        self.r = state.r;
        self.pc = state.pc;
        self.sp = state.sp;
        self.ix = state.ix;
        self.iy = state.iy;
        self.wz = state.wz;
        self.tacts = ((state.tacts_h as u64) << 32) | state.tacts_l as u64;
        self.state_flags = state.state_flags;
        self.iff1 = state.iff1;
        self.iff2 = state.iff2;
        self.interrupt_mode = state.interrupt_mode;
        self.is_interrupt_blocked = state.is_interrupt_blocked;
        self.is_in_op_execution = state.is_in_op_execution;
        self.prefix_mode = state.prefix_mode;
        self.index_mode = state.index_mode;
        self.maskable_interrupt_mode_entered = state.maskable_interrupt_mode_entered;
        self.op_code = state.op_code;
        self.use_gate_array_contention = state.use_gate_array_contention;
    }
}
