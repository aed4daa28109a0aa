//! The candidate intake wizard: a three-step state machine over two form
//! groups with a derived preview, draft autosave/resume and submission.

pub mod cascade;
pub mod forms;
pub mod handlers;
pub mod machine;
pub mod preview;
pub mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use forms::ValidationReport;
pub use machine::{WizardDeps, WizardMachine, WizardView};
pub use session::{SessionRegistry, WizardSession};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{} field(s) need attention", .0.fields.len())]
    Validation(ValidationReport),

    #[error("Organization ID missing")]
    MissingOrganization,

    #[error("Submission failed: {message}")]
    Submission { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    #[default]
    BasicInfo,
    AddressInfo,
    Preview,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::BasicInfo => 1,
            Step::AddressInfo => 2,
            Step::Preview => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Step> {
        match n {
            1 => Some(Step::BasicInfo),
            2 => Some(Step::AddressInfo),
            3 => Some(Step::Preview),
            _ => None,
        }
    }

    /// Class name used by progress indicators.
    pub fn css_class(self) -> &'static str {
        match self {
            Step::BasicInfo => "step1",
            Step::AddressInfo => "step2",
            Step::Preview => "step3",
        }
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Step::from_number(n).ok_or_else(|| format!("no wizard step {n}"))
    }
}
