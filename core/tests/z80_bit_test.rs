use ferrite_core::cpu::z80::Z80;
mod common;
use common::TestBus;

fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u64 {
    let start = cpu.tacts;
    loop {
        cpu.execute_cpu_cycle(bus);
        if !cpu.is_in_op_execution {
            return cpu.tacts - start;
        }
    }
}

// --- RES/SET ---

#[test]
fn test_res_0_b() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.b = 0xFF;
    cpu.f = 0x01;
    bus.load(0, &[0xCB, 0x80]); // RES 0,B

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 8);
    assert_eq!(cpu.b, 0xFE);
    assert_eq!(cpu.pc, 0x0002);
    assert_eq!(cpu.f, 0x01, "RES leaves flags alone");
}

#[test]
fn test_res_0_hl() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    bus.memory[0x1000] = 0xFF;
    bus.load(0, &[0xCB, 0x86]); // RES 0,(HL)

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 15);
    assert_eq!(bus.memory[0x1000], 0xFE);
    assert_eq!(cpu.pc, 0x0002);
}

#[test]
fn test_set_7_hl() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    bus.memory[0x1000] = 0x00;
    bus.load(0, &[0xCB, 0xFE]); // SET 7,(HL)

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 15);
    assert_eq!(bus.memory[0x1000], 0x80);
}

// --- BIT ---

#[test]
fn test_bit_zero_result() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.b = 0xFE;
    cpu.f = 0x01;
    bus.load(0, &[0xCB, 0x40]); // BIT 0,B

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 8);
    assert_ne!(cpu.f & 0x40, 0, "Z set when bit clear");
    assert_ne!(cpu.f & 0x04, 0, "PV copies Z");
    assert_ne!(cpu.f & 0x10, 0, "H always set");
    assert_eq!(cpu.f & 0x02, 0, "N cleared");
    assert_ne!(cpu.f & 0x01, 0, "C preserved");
}

#[test]
fn test_bit_7_sets_sign() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    bus.load(0, &[0xCB, 0x7F]); // BIT 7,A

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.f & 0x40, 0, "bit is set: Z clear");
    assert_ne!(cpu.f & 0x80, 0, "S mirrors a set bit 7");
}

#[test]
fn test_bit_register_xy_from_operand() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.b = 0x28;
    bus.load(0, &[0xCB, 0x68]); // BIT 5,B

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.f & 0x28, 0x28, "X/Y from the tested register");
}

#[test]
fn test_bit_hl_xy_from_wz() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    cpu.wz = 0x2800; // WZ high byte carries bits 5/3
    bus.memory[0x1000] = 0x01;
    bus.load(0, &[0xCB, 0x46]); // BIT 0,(HL)

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 12);
    assert_eq!(cpu.f & 0x40, 0, "bit set: Z clear");
    assert_eq!(cpu.f & 0x28, 0x28, "X/Y from WZ high byte");
}

// --- Rotates and shifts ---

#[test]
fn test_rlc_r() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.b = 0x81;
    bus.load(0, &[0xCB, 0x00]); // RLC B

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 8);
    assert_eq!(cpu.b, 0x03);
    assert_ne!(cpu.f & 0x01, 0, "C = old bit 7");
    assert_ne!(cpu.f & 0x04, 0, "PV = parity of 0x03 (even)");
}

#[test]
fn test_rrc_r() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.c = 0x01;
    bus.load(0, &[0xCB, 0x09]); // RRC C

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.c, 0x80);
    assert_ne!(cpu.f & 0x01, 0);
    assert_ne!(cpu.f & 0x80, 0, "S from result bit 7");
}

#[test]
fn test_rl_through_carry() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.d = 0x80;
    cpu.f = 0x01;
    bus.load(0, &[0xCB, 0x12]); // RL D

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.d, 0x01, "old carry enters bit 0");
    assert_ne!(cpu.f & 0x01, 0, "old bit 7 leaves through carry");
}

#[test]
fn test_rr_through_carry() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.e = 0x01;
    cpu.f = 0x00;
    bus.load(0, &[0xCB, 0x1B]); // RR E

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.e, 0x00);
    assert_ne!(cpu.f & 0x01, 0);
    assert_ne!(cpu.f & 0x40, 0, "Z from zero result");
}

#[test]
fn test_sla() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.h = 0xC0;
    bus.load(0, &[0xCB, 0x24]); // SLA H

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.h, 0x80);
    assert_ne!(cpu.f & 0x01, 0);
}

#[test]
fn test_sra_preserves_sign() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.l = 0x81;
    bus.load(0, &[0xCB, 0x2D]); // SRA L

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.l, 0xC0, "bit 7 duplicated");
    assert_ne!(cpu.f & 0x01, 0, "old bit 0 into carry");
}

#[test]
fn test_sll_shifts_one_in() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.a = 0x00;
    bus.load(0, &[0xCB, 0x37]); // SLL A (undocumented)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x01, "SLL always sets bit 0");
    assert_eq!(cpu.f & 0x01, 0);
}

#[test]
fn test_srl() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.b = 0x81;
    bus.load(0, &[0xCB, 0x38]); // SRL B

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.b, 0x40);
    assert_ne!(cpu.f & 0x01, 0);
    assert_eq!(cpu.f & 0x80, 0, "S clear: top bit is always zero");
}

#[test]
fn test_rlc_hl() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    bus.memory[0x1000] = 0x81;
    bus.load(0, &[0xCB, 0x06]); // RLC (HL)

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 15);
    assert_eq!(bus.memory[0x1000], 0x03);
}
