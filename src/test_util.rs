//! Shared test helpers.

#[cfg(test)]
pub(crate) fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .is_test(true)
        .try_init();
}
