use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use ferrite_core::cpu::z80::Z80;
use ferrite_cpu_validation::{BusOp, CpuState, TestCase, TracingBus, write_tests_gz};
use rand::Rng;

const NUM_TESTS: usize = 1000;

fn build_ram(memory: &[u8; 0x10000], addresses: &BTreeSet<u16>) -> Vec<(u16, u8)> {
    addresses
        .iter()
        .map(|&addr| (addr, memory[addr as usize]))
        .collect()
}

/// Returns instruction byte count for unprefixed opcodes, or None for the
/// prefix bytes (their groups get their own generators).
fn opcode_size(opcode: u8) -> Option<u8> {
    match opcode {
        0xCB | 0xDD | 0xED | 0xFD => None,

        // --- 16-bit immediate / absolute address (size 3) ---
        0x01 | 0x11 | 0x21 | 0x31 => Some(3), // LD rr,nn
        0x22 | 0x2A | 0x32 | 0x3A => Some(3), // LD (nn),HL / LD HL,(nn) / LD (nn),A / LD A,(nn)
        0xC3 | 0xCD => Some(3),               // JP nn, CALL nn
        op if (op & 0xC7) == 0xC2 => Some(3), // JP cc,nn
        op if (op & 0xC7) == 0xC4 => Some(3), // CALL cc,nn

        // --- 8-bit immediate / displacement (size 2) ---
        0x10 | 0x18 => Some(2),               // DJNZ, JR
        0xD3 | 0xDB => Some(2),               // OUT (n),A / IN A,(n)
        op if (op & 0xC7) == 0x06 => Some(2), // LD r,n
        op if (op & 0xE7) == 0x20 => Some(2), // JR cc,e
        op if (op & 0xC7) == 0xC6 => Some(2), // ALU A,n

        _ => Some(1),
    }
}

/// Generate NUM_TESTS randomized single-instruction vectors for one opcode.
fn generate_opcode(rng: &mut impl Rng, opcode: u8, instr_size: u8) -> Vec<TestCase> {
    let mut tests = Vec::with_capacity(NUM_TESTS);
    let max_pc = (0x10000u32 - instr_size as u32) as u16;

    for _ in 0..NUM_TESTS {
        let mut cpu = Z80::new(false);
        cpu.reset();
        let mut bus = TracingBus::new();

        // Fill entire 64KB with random data
        rng.fill(&mut bus.memory[..]);
        bus.port_input = rng.r#gen();

        // Randomize all registers
        cpu.a = rng.r#gen();
        cpu.f = rng.r#gen();
        cpu.set_bc(rng.r#gen());
        cpu.set_de(rng.r#gen());
        cpu.set_hl(rng.r#gen());
        cpu.a_prime = rng.r#gen();
        cpu.f_prime = rng.r#gen();
        cpu.ix = rng.r#gen();
        cpu.iy = rng.r#gen();
        cpu.sp = rng.r#gen();
        cpu.wz = rng.r#gen();
        cpu.pc = rng.gen_range(0..=max_pc);

        // Place the opcode byte; operand bytes are already random from the fill
        let pc = cpu.pc;
        bus.memory[pc as usize] = opcode;

        let pre_memory = bus.memory;
        let initial_cpu = cpu.get_state();

        // Execute one complete instruction
        loop {
            cpu.execute_cpu_cycle(&mut bus);
            if !cpu.is_in_op_execution {
                break;
            }
        }

        let final_cpu = cpu.get_state();

        // Collect all accessed addresses (ports live in their own space)
        let addresses: BTreeSet<u16> = bus
            .cycles
            .iter()
            .filter(|c| c.op == BusOp::Read || c.op == BusOp::Write)
            .map(|c| c.addr)
            .collect();

        let cycles: Vec<(u16, u8, String)> = bus
            .cycles
            .iter()
            .map(|c| {
                let op_str = match c.op {
                    BusOp::Read => "read",
                    BusOp::Write => "write",
                    BusOp::PortRead => "port_read",
                    BusOp::PortWrite => "port_write",
                };
                (c.addr, c.data, op_str.to_string())
            })
            .collect();

        let name = (0..instr_size as u16)
            .map(|i| format!("{:02x}", pre_memory[pc.wrapping_add(i) as usize]))
            .collect::<Vec<_>>()
            .join(" ");

        tests.push(TestCase {
            name,
            initial: CpuState {
                cpu: initial_cpu,
                ram: build_ram(&pre_memory, &addresses),
            },
            final_state: CpuState {
                cpu: final_cpu,
                ram: build_ram(&bus.memory, &addresses),
            },
            cycles,
        });
    }

    tests
}

fn generate_and_write(rng: &mut impl Rng, opcode: u8, instr_size: u8, out_dir: &Path) {
    let tests = generate_opcode(rng, opcode, instr_size);
    let out_path = out_dir.join(format!("{opcode:02x}.json.gz"));
    write_tests_gz(&out_path, &tests).expect("Failed to write output file");
    println!(
        "Generated {} tests for 0x{:02X} -> {}",
        tests.len(),
        opcode,
        out_path.display()
    );
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: gen_z80_tests <opcode_hex | all>");
        eprintln!("Examples:");
        eprintln!("  gen_z80_tests 0x3e");
        eprintln!("  gen_z80_tests all");
        std::process::exit(1);
    }

    let out_dir = Path::new("test_data/z80");
    fs::create_dir_all(out_dir).expect("Failed to create output directory");

    let mut rng = rand::thread_rng();

    if args[1] == "all" {
        let mut count = 0;
        for opcode in 0x00..=0xFFu8 {
            if let Some(size) = opcode_size(opcode) {
                generate_and_write(&mut rng, opcode, size, out_dir);
                count += 1;
            }
        }
        println!("Generated vectors for {count} opcodes");
    } else {
        let text = args[1].trim_start_matches("0x");
        let opcode = u8::from_str_radix(text, 16).expect("Invalid opcode");
        match opcode_size(opcode) {
            Some(size) => generate_and_write(&mut rng, opcode, size, out_dir),
            None => eprintln!("0x{opcode:02X} is a prefix byte; not generated standalone"),
        }
    }
}
