use bookly_domain::destination::Destination;
use bookly_otp::{ChallengeUiState, Navigator, Notice, Notifier, Phase};

/// Prints the route instead of navigating.
#[derive(Clone, Copy, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, destination: Destination) {
        println!("→ continue at {}", destination.path());
    }
}

/// Toasts as terminal lines; errors go to stderr.
#[derive(Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            eprintln!("✗ {notice}");
        } else {
            println!("✓ {notice}");
        }
    }
}

pub fn render(state: &ChallengeUiState) -> String {
    let email = state.email.as_ref().map(|e| e.as_str()).unwrap_or("-");
    let resend = if state.can_resend {
        "resend available".to_owned()
    } else if state.phase == Phase::Verified {
        "done".to_owned()
    } else {
        format!("resend in {}s", state.seconds_until_resend_allowed)
    };
    format!(
        "[{:?}] {email} code: {:<6} {resend}",
        state.phase,
        mask(&state.digits),
    )
}

fn mask(digits: &str) -> String {
    let mut out = digits.to_owned();
    out.extend(std::iter::repeat_n('_', 6usize.saturating_sub(digits.len())));
    out
}
