//! Terminal stand-ins for the browser's dialogs and router.

use std::io::{self, BufRead, Write};

use nb_core::models::Route;
use nb_core::traits::{Dialog, Navigator};

/// `alert` and `confirm` on stderr/stdin.
pub struct TerminalDialog;

impl Dialog for TerminalDialog {
    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }

    fn confirm(&self, message: &str) -> bool {
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "{} [y/N] ", message);
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes" | "예"),
        }
    }
}

/// Prints each route it is sent to.
pub struct PrintingNavigator;

impl Navigator for PrintingNavigator {
    fn navigate(&self, route: Route) {
        println!("{}", route);
    }
}
