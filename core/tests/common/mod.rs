use ferrite_core::core::Bus;

/// Minimal bus for testing: flat 64KB memory, a port input latch, recorded
/// port writes, no contention.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub port_input: u8,
    pub port_writes: Vec<(u16, u8)>,
    pub int_vector: u8,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            port_input: 0xFF,
            port_writes: Vec::new(),
            int_vector: 0xFF,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    fn read_memory(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write_memory(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn read_port(&mut self, _addr: u16) -> u8 {
        self.port_input
    }

    fn write_port(&mut self, addr: u16, data: u8) {
        self.port_writes.push((addr, data));
    }

    fn interrupt_vector(&mut self) -> u8 {
        self.int_vector
    }
}
