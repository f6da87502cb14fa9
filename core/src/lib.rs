pub mod core;
pub mod cpu;

pub mod prelude {
    pub use crate::core::Bus;
    pub use crate::cpu::Z80State;
    pub use crate::cpu::z80::{IndexMode, PrefixMode, Signal, Z80};
}
