// Status lines printed around the diagnostic stream. All of them go to
// stderr so stdout stays clean for `--format json` and `--dry-run`.

#[macro_export]
macro_rules! ui_ok {
    ($($arg:tt)*) => {{
        eprintln!("✔ {}", format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! ui_err {
    ($($arg:tt)*) => {{
        eprintln!("✖ {}", format_args!($($arg)*));
    }};
}
