/// Host-side bus interface. The CPU never touches memory or I/O except
/// through these hooks; the host owns both address spaces.
///
/// Timing is the CPU's job, not the bus's: the core charges the documented
/// minimum tacts for every access (3 T memory, 4 T port) and, when gate-array
/// contention is enabled, adds whatever `contention()` reports on top.
pub trait Bus {
    fn read_memory(&mut self, addr: u16) -> u8;
    fn write_memory(&mut self, addr: u16, data: u8);

    /// Read from the 16-bit I/O port address space (separate from memory).
    fn read_port(&mut self, addr: u16) -> u8;

    /// Write to the 16-bit I/O port address space.
    fn write_port(&mut self, addr: u16, data: u8);

    /// Extra tacts the host charges for touching `addr`.
    /// Queried only when the CPU runs with gate-array contention enabled.
    fn contention(&mut self, _addr: u16) -> u64 {
        0
    }

    /// Byte the interrupting device drives onto the data bus during INT
    /// acknowledge. The default matches a floating bus reading 0xFF.
    fn interrupt_vector(&mut self) -> u8 {
        0xFF
    }
}
