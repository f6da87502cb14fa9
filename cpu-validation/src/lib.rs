use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use ferrite_core::core::Bus;
use ferrite_core::cpu::Z80State;
use ferrite_core::cpu::z80::Z80;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory with cycle-by-cycle recording ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusOp {
    Read,
    Write,
    PortRead,
    PortWrite,
}

#[derive(Clone, Debug)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: [u8; 0x10000],
    pub port_input: u8,
    pub cycles: Vec<BusCycle>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            port_input: 0xFF,
            cycles: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read_memory(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write_memory(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::Write,
        });
    }

    fn read_port(&mut self, addr: u16) -> u8 {
        let data = self.port_input;
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::PortRead,
        });
        data
    }

    fn write_port(&mut self, addr: u16, data: u8) {
        self.cycles.push(BusCycle {
            addr,
            data,
            op: BusOp::PortWrite,
        });
    }
}

// --- JSON test vector types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub initial: CpuState,
    #[serde(rename = "final")]
    pub final_state: CpuState,
    pub cycles: Vec<(u16, u8, String)>,
}

/// Full CPU snapshot plus the sparse set of RAM cells the test touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuState {
    pub cpu: Z80State,
    pub ram: Vec<(u16, u8)>,
}

/// Serialize test vectors to a gzipped JSON file.
pub fn write_tests_gz(path: &Path, tests: &[TestCase]) -> io::Result<()> {
    let json = serde_json::to_vec(tests).map_err(io::Error::other)?;
    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
    encoder.write_all(&json)?;
    encoder.finish()?;
    Ok(())
}

/// Load test vectors from a gzipped JSON file.
pub fn read_tests_gz(path: &Path) -> io::Result<Vec<TestCase>> {
    let mut decoder = GzDecoder::new(File::open(path)?);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json)?;
    serde_json::from_slice(&json).map_err(io::Error::other)
}

// --- Stepping runner ---

/// How far a test drive should advance the CPU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExecutionMode {
    /// One complete instruction (prefix bytes included).
    OneInstruction,
    /// Run until the CPU raises its HALTED signal.
    UntilHalt,
    /// Run until PC reaches the given address at an instruction boundary.
    UntilEnd(u16),
}

/// Drive the CPU in the requested mode and return the tacts consumed.
/// A step ceiling guards against runaway programs in broken vectors.
pub fn run<B: Bus + ?Sized>(cpu: &mut Z80, bus: &mut B, mode: ExecutionMode) -> u64 {
    const STEP_LIMIT: u32 = 1_000_000;
    let start = cpu.tacts;
    let mut steps = 0;
    loop {
        cpu.execute_cpu_cycle(bus);
        steps += 1;
        let boundary = !cpu.is_in_op_execution;
        let done = match mode {
            ExecutionMode::OneInstruction => boundary,
            ExecutionMode::UntilHalt => cpu.is_halted(),
            ExecutionMode::UntilEnd(addr) => boundary && cpu.pc == addr,
        };
        if done || steps >= STEP_LIMIT {
            return cpu.tacts - start;
        }
    }
}
