pub mod config;
pub mod config_file;
pub mod consistency;
pub mod coupling;
pub mod forcing_series;
pub mod handle;
pub mod mass_balance;
pub mod scheduler;
pub mod scheme;
pub mod standard_variables;
pub mod transfer;
pub mod value;
pub mod variable;

pub mod errors;

#[cfg(test)]
mod test_support;
