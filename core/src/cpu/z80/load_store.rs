use crate::core::Bus;
use crate::cpu::z80::{IndexMode, Z80};

impl Z80 {
    /// LD r, n — 7 T: M1 + MR
    /// LD (HL), n — 10 T: M1 + MR + MW
    /// LD (IX+d), n — 19 T: the displacement and the immediate are both in
    /// the code stream before the 2 T address calculation.
    /// Opcode mask: 00 rrr 110
    pub(crate) fn op_ld_r_n<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let r = (opcode >> 3) & 0x07;

        if r == 6 {
            if self.index_mode == IndexMode::None {
                let value = self.read_code(bus);
                let addr = self.get_hl();
                self.write_mem(bus, addr, value);
            } else {
                let addr = self.effective_addr(bus, 0);
                let value = self.read_code(bus);
                self.delay(2);
                self.write_mem(bus, addr, value);
            }
        } else {
            let value = self.read_code(bus);
            self.set_reg8_ix(r, value);
        }
    }

    /// LD r, r' — 4 T (register-register, IXH/IXL under a prefix)
    /// LD r, (HL) — 7 T; LD r, (IX+d) — 19 T
    /// LD (HL), r — 7 T; LD (IX+d), r — 19 T
    /// The memory forms use the plain register set: H stays H next to (IX+d).
    /// Opcode mask: 01 dst src
    pub(crate) fn op_ld_r_r<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let src = opcode & 0x07;
        let dst = (opcode >> 3) & 0x07;

        if src == 6 {
            let addr = self.effective_addr(bus, 5);
            let value = self.read_mem(bus, addr);
            self.set_reg8(dst, value);
        } else if dst == 6 {
            let addr = self.effective_addr(bus, 5);
            let value = self.get_reg8(src);
            self.write_mem(bus, addr, value);
        } else {
            let value = self.get_reg8_ix(src);
            self.set_reg8_ix(dst, value);
        }
    }

    /// LD rr, nn — 10 T: M1 + MR + MR
    /// Opcode mask: 00 rr0 001 (rr: 0=BC, 1=DE, 2=HL/IX/IY, 3=SP)
    pub(crate) fn op_ld_rr_nn<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let rp = (opcode >> 4) & 0x03;
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        self.set_rp(rp, ((high as u16) << 8) | low as u16);
    }

    /// LD A, (BC) — 7 T. WZ = BC + 1.
    pub(crate) fn op_ld_a_bc<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_bc();
        self.a = self.read_mem(bus, addr);
        self.wz = addr.wrapping_add(1);
    }

    /// LD A, (DE) — 7 T. WZ = DE + 1.
    pub(crate) fn op_ld_a_de<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_de();
        self.a = self.read_mem(bus, addr);
        self.wz = addr.wrapping_add(1);
    }

    /// LD (BC), A — 7 T. WZ low = (BC+1) & 0xFF, WZ high = A.
    pub(crate) fn op_ld_bc_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_bc();
        self.write_mem(bus, addr, self.a);
        self.wz = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
    }

    /// LD (DE), A — 7 T. WZ low = (DE+1) & 0xFF, WZ high = A.
    pub(crate) fn op_ld_de_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.get_de();
        self.write_mem(bus, addr, self.a);
        self.wz = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
    }

    /// LD A, (nn) — 13 T. WZ = nn + 1.
    pub(crate) fn op_ld_a_nn<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let addr = ((high as u16) << 8) | low as u16;
        self.a = self.read_mem(bus, addr);
        self.wz = addr.wrapping_add(1);
    }

    /// LD (nn), A — 13 T. WZ low = (nn+1) & 0xFF, WZ high = A.
    pub(crate) fn op_ld_nn_a<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let addr = ((high as u16) << 8) | low as u16;
        self.write_mem(bus, addr, self.a);
        self.wz = ((self.a as u16) << 8) | (addr.wrapping_add(1) & 0xFF);
    }

    /// LD (nn), HL (HL doubles as IX/IY under a prefix) — 16 T. WZ = nn + 1.
    pub(crate) fn op_ld_nn_hl<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let addr = ((high as u16) << 8) | low as u16;
        let value = self.get_rp(2);
        self.write_mem(bus, addr, value as u8);
        self.write_mem(bus, addr.wrapping_add(1), (value >> 8) as u8);
        self.wz = addr.wrapping_add(1);
    }

    /// LD HL, (nn) — 16 T. WZ = nn + 1.
    pub(crate) fn op_ld_hl_nn_ind<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let addr = ((high as u16) << 8) | low as u16;
        let value_low = self.read_mem(bus, addr);
        let value_high = self.read_mem(bus, addr.wrapping_add(1));
        self.set_rp(2, ((value_high as u16) << 8) | value_low as u16);
        self.wz = addr.wrapping_add(1);
    }

    /// LD (nn), rr (ED) — 20 T. WZ = nn + 1.
    /// Opcode mask: 01 rr0 011
    pub(crate) fn op_ld_nn_rr_ed<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let rp = (opcode >> 4) & 0x03;
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let addr = ((high as u16) << 8) | low as u16;
        let value = self.get_rp(rp);
        self.write_mem(bus, addr, value as u8);
        self.write_mem(bus, addr.wrapping_add(1), (value >> 8) as u8);
        self.wz = addr.wrapping_add(1);
    }

    /// LD rr, (nn) (ED) — 20 T. WZ = nn + 1.
    /// Opcode mask: 01 rr1 011
    pub(crate) fn op_ld_rr_nn_ed<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let rp = (opcode >> 4) & 0x03;
        let low = self.read_code(bus);
        let high = self.read_code(bus);
        let addr = ((high as u16) << 8) | low as u16;
        let value_low = self.read_mem(bus, addr);
        let value_high = self.read_mem(bus, addr.wrapping_add(1));
        self.set_rp(rp, ((value_high as u16) << 8) | value_low as u16);
        self.wz = addr.wrapping_add(1);
    }

    /// LD SP, HL — 6 T (LD SP,IX/IY under a prefix)
    pub(crate) fn op_ld_sp_hl(&mut self) {
        self.sp = self.get_rp(2);
        self.delay(2);
    }

    /// EX AF, AF' — 4 T
    pub(crate) fn op_ex_af_af(&mut self) {
        core::mem::swap(&mut self.a, &mut self.a_prime);
        core::mem::swap(&mut self.f, &mut self.f_prime);
    }

    /// EX DE, HL — 4 T. Not index-rewritten: DD EB still swaps DE with HL.
    pub(crate) fn op_ex_de_hl(&mut self) {
        core::mem::swap(&mut self.d, &mut self.h);
        core::mem::swap(&mut self.e, &mut self.l);
    }

    /// EXX — 4 T: swap BC/DE/HL with the shadow bank
    pub(crate) fn op_exx(&mut self) {
        core::mem::swap(&mut self.b, &mut self.b_prime);
        core::mem::swap(&mut self.c, &mut self.c_prime);
        core::mem::swap(&mut self.d, &mut self.d_prime);
        core::mem::swap(&mut self.e, &mut self.e_prime);
        core::mem::swap(&mut self.h, &mut self.h_prime);
        core::mem::swap(&mut self.l, &mut self.l_prime);
    }
}
