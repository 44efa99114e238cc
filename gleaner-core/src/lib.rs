pub mod report;
pub mod run;

pub fn print_banner() {
    println!(
        r#"
   ___ _
  / __| |___ __ _ _ _  ___ _ _
 | (_ | / -_) _` | ' \/ -_) '_|
  \___|_\___\__,_|_||_\___|_|   v{}

  declarative tabular data extraction from HTML
"#,
        env!("CARGO_PKG_VERSION")
    );
}
