//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter        | Implements                      | Connects to            |
//! |----------------|---------------------------------|------------------------|
//! | `sim_engine`   | GattServerFactory, GattServer   | In-memory GATT engine  |
//! | `log_callback` | GattServerCallback              | Log output             |

pub mod log_callback;
pub mod sim_engine;
