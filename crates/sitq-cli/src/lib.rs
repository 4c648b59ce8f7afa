pub mod commands;
pub mod notifier;

/// Exit status when the config file does not exist
pub const EXIT_CONFIG_NOT_FOUND: u8 = 2;

/// Map a command failure to the process exit status
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<sitq_core::Error>() {
        Some(sitq_core::Error::ConfigNotFound(_)) => EXIT_CONFIG_NOT_FOUND,
        _ => 1,
    }
}
