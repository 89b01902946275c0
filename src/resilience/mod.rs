pub mod circuit_breaker;

#[cfg(test)]
mod tests;

pub use circuit_breaker::{
    CallError, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, CircuitState,
};
