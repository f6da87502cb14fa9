use ferrite_core::cpu::z80::{Signal, Z80};
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

// ============================================================
// Maskable interrupt
// ============================================================

#[test]
fn test_im1_interrupt() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.iff2 = true;
    cpu.interrupt_mode = 1;
    cpu.set_signal(Signal::Int);

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 13, "IM 1 acknowledge is 13 T-states");
    assert_eq!(cpu.pc, 0x0038);
    assert_eq!(cpu.wz, 0x0038);
    assert_eq!(cpu.sp, 0x0FFE);
    assert_eq!(bus.memory[0x0FFF], 0x01, "pushed PC high");
    assert_eq!(bus.memory[0x0FFE], 0x00, "pushed PC low");
    assert!(!cpu.iff1);
    assert!(!cpu.iff2, "maskable acknowledge clears both latches");
    assert!(cpu.maskable_interrupt_mode_entered);
}

#[test]
fn test_im0_behaves_as_rst_38() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.pc = 0x0200;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.interrupt_mode = 0;
    cpu.set_signal(Signal::Int);

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 13);
    assert_eq!(cpu.pc, 0x0038);
}

#[test]
fn test_im2_vector_fetch() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.interrupt_mode = 2;
    cpu.i = 0x3F;
    bus.int_vector = 0xFF;
    bus.memory[0x3FFF] = 0x45;
    bus.memory[0x4000] = 0x23;
    cpu.set_signal(Signal::Int);

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 19, "IM 2 acknowledge is 19 T-states");
    assert_eq!(cpu.pc, 0x2345);
    assert_eq!(cpu.wz, 0x2345, "WZ holds the fetched vector");
    assert!(cpu.maskable_interrupt_mode_entered);
}

#[test]
fn test_int_ignored_when_disabled() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.iff1 = false;
    cpu.set_signal(Signal::Int);
    bus.load(0, &[0x00]); // NOP

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 4, "normal execution continues");
    assert_eq!(cpu.pc, 0x0001);
}

#[test]
fn test_ei_delays_interrupt_by_one_instruction() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.interrupt_mode = 1;
    cpu.set_signal(Signal::Int);
    bus.load(0, &[0xFB, 0x00]); // EI ; NOP

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0001, "EI executed, interrupt still pending");

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0002, "the instruction after EI runs first");

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0038, "interrupt lands after the EI shadow");
}

#[test]
fn test_int_not_taken_between_prefix_and_opcode() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.ix = 0x1000;
    cpu.set_bc(0x0100);
    cpu.sp = 0x2000;
    cpu.interrupt_mode = 1;
    bus.load(0, &[0xDD, 0x09]); // ADD IX,BC

    cpu.execute_cpu_cycle(&mut bus); // DD prefix
    assert!(cpu.is_in_op_execution);

    cpu.iff1 = true;
    cpu.set_signal(Signal::Int);
    cpu.execute_cpu_cycle(&mut bus); // must finish ADD IX,BC
    assert_eq!(cpu.ix, 0x1100);
    assert_eq!(cpu.pc, 0x0002);

    cpu.execute_cpu_cycle(&mut bus); // now the interrupt
    assert_eq!(cpu.pc, 0x0038);
}

// ============================================================
// NMI
// ============================================================

#[test]
fn test_nmi() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.iff2 = true;
    cpu.set_signal(Signal::Nmi);

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 11, "NMI response is 11 T-states");
    assert_eq!(cpu.pc, 0x0066);
    assert_eq!(cpu.sp, 0x0FFE);
    assert_eq!(bus.memory[0x0FFF], 0x01);
    assert_eq!(bus.memory[0x0FFE], 0x00);
    assert!(!cpu.iff1, "IFF1 cleared");
    assert!(cpu.iff2, "IFF2 keeps the pre-NMI IFF1");
    assert_eq!(cpu.state_flags & Signal::Nmi as u8, 0, "request consumed");
}

#[test]
fn test_nmi_beats_int() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.iff1 = false; // INT masked, NMI is not
    cpu.set_signal(Signal::Int);
    cpu.set_signal(Signal::Nmi);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0066, "NMI serviced despite the masked INT");
}

#[test]
fn test_nmi_then_retn_restores_iff1() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.set_signal(Signal::Nmi);
    bus.load(0x0066, &[0xED, 0x45]); // RETN

    run_instruction(&mut cpu, &mut bus); // NMI entry
    assert!(!cpu.iff1);
    run_instruction(&mut cpu, &mut bus); // RETN
    assert!(cpu.iff1, "RETN copies the preserved IFF2 back");
    assert_eq!(cpu.pc, 0x0100);
}

// ============================================================
// HALT
// ============================================================

#[test]
fn test_halt_sets_flag_and_holds_pc() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    bus.load(0, &[0x76]); // HALT

    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 4);
    assert!(cpu.is_halted());
    assert_eq!(cpu.pc, 0x0000, "PC stays on the HALT instruction");
}

#[test]
fn test_halted_cpu_burns_refresh_cycles() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    bus.load(0, &[0x76]); // HALT

    run_instruction(&mut cpu, &mut bus);
    let r_before = cpu.r;
    let tacts = run_instruction(&mut cpu, &mut bus);
    assert_eq!(tacts, 4, "idle refresh cycle");
    assert_eq!(cpu.pc, 0x0000);
    assert_eq!(cpu.r, r_before.wrapping_add(1), "R keeps counting");
}

#[test]
fn test_interrupt_wakes_halt() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.interrupt_mode = 1;
    bus.load(0, &[0x76]); // HALT

    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.is_halted());

    cpu.iff1 = true;
    cpu.set_signal(Signal::Int);
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc, 0x0038);
    assert_eq!(
        bus.memory[0x0FFE],
        0x01,
        "return address is the byte after HALT"
    );
}

#[test]
fn test_nmi_wakes_halt() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    bus.load(0, &[0x76]); // HALT

    run_instruction(&mut cpu, &mut bus);
    cpu.set_signal(Signal::Nmi);
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.is_halted());
    assert_eq!(cpu.pc, 0x0066);
    assert_eq!(bus.memory[0x0FFE], 0x01);
}

// ============================================================
// RESET signal
// ============================================================

#[test]
fn test_reset_signal_serviced() {
    let mut cpu = Z80::new(false);
    cpu.reset();
    let mut bus = TestBus::new();
    cpu.pc = 0x1234;
    cpu.iff1 = true;
    cpu.interrupt_mode = 2;
    cpu.tacts = 999;
    cpu.set_signal(Signal::Reset);

    cpu.execute_cpu_cycle(&mut bus);
    assert_eq!(cpu.pc, 0x0000);
    assert_eq!(cpu.tacts, 0);
    assert!(!cpu.iff1);
    assert_eq!(cpu.interrupt_mode, 0);
    assert_eq!(cpu.state_flags, 0, "all signals cleared, HALT included");
}
