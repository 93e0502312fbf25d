use core::fmt;
use core::str::FromStr;

use crate::config;

/// Board variant, selected by the LED color of the Sensor Watch board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardColor {
    Red,
    Green,
    Blue,
}

impl BoardColor {
    pub fn as_str(self) -> &'static str {
        match self {
            BoardColor::Red => "RED",
            BoardColor::Green => "GREEN",
            BoardColor::Blue => "BLUE",
        }
    }

    /// `COLOR=<C>` argument passed to make.
    pub fn make_arg(self) -> String {
        format!("COLOR={}", self.as_str())
    }
}

impl FromStr for BoardColor {
    type Err = String;

    /// Case-insensitive: `red`, `Red` and `RED` all select the red board.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RED" => Ok(BoardColor::Red),
            "GREEN" => Ok(BoardColor::Green),
            "BLUE" => Ok(BoardColor::Blue),
            _ => Err("first argument must be RED, GREEN, or BLUE.".to_string()),
        }
    }
}

impl fmt::Display for BoardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// `make COLOR=<C>`; selected by giving no action word.
    #[default]
    Build,
    /// `make COLOR=<C>` then `make install COLOR=<C>`
    Install,
    /// `emmake make COLOR=<C>` then serve build-sim over HTTP
    Emulate,
    /// `make clean COLOR=<C>`
    Clean,
}

impl FromStr for Action {
    type Err = String;

    /// Exact, lower-case action words only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "install" => Ok(Action::Install),
            "emulate" => Ok(Action::Emulate),
            "clean" => Ok(Action::Clean),
            _ => Err(format!("Unrecognized option '{s}'.")),
        }
    }
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub program: &'static str,
    pub args: Vec<String>,
    /// Name used in the failure message, e.g. `make install`.
    pub label: &'static str,
    /// A non-zero exit does not fail the plan (e.g. a server stopped with Ctrl+C).
    pub tolerate_failure: bool,
}

impl Step {
    fn new(program: &'static str, label: &'static str, args: &[&str]) -> Self {
        Self {
            program,
            args: args.iter().map(|a| (*a).to_string()).collect(),
            label,
            tolerate_failure: false,
        }
    }

    fn tolerating_failure(mut self) -> Self {
        self.tolerate_failure = true;
        self
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Ordered steps for one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub headline: String,
    pub steps: Vec<Step>,
    pub success: Option<&'static str>,
    /// Whether the build time is stamped before the steps run.
    pub stamp: bool,
}

pub fn plan(color: BoardColor, action: Action) -> Plan {
    let color_arg = color.make_arg();
    let color_arg = color_arg.as_str();

    match action {
        Action::Build => Plan {
            headline: format!("Building with {color_arg}"),
            steps: vec![Step::new(config::MAKE, "make", &[color_arg])],
            success: Some("Firmware successfully built!!!!"),
            stamp: true,
        },
        Action::Install => Plan {
            headline: format!("Building and installing with {color_arg}"),
            steps: vec![
                Step::new(config::MAKE, "make", &[color_arg]),
                Step::new(config::MAKE, "make install", &["install", color_arg]),
            ],
            success: Some("Firmware successfully built and installed!!!!"),
            stamp: true,
        },
        Action::Emulate => Plan {
            headline: format!("Building and emulating with {color_arg}"),
            steps: vec![
                Step::new(config::EMMAKE, "emmake", &[config::MAKE, color_arg]),
                Step::new(
                    config::PYTHON,
                    "http.server",
                    &["-m", "http.server", "-d", config::SIM_OUTPUT_DIR],
                )
                .tolerating_failure(),
            ],
            success: None,
            stamp: true,
        },
        // Nothing is compiled, so main.c is left alone.
        Action::Clean => Plan {
            headline: "Cleaning up the build".to_string(),
            steps: vec![Step::new(config::MAKE, "make clean", &["clean", color_arg])],
            success: Some("Cleanup finished successfully."),
            stamp: false,
        },
    }
}
