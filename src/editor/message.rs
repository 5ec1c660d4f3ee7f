use std::time::{Duration, Instant};

/// Transient user-facing message. Showing a new message restarts the expiry
/// timer, canceling the pending clear of the previous one.
pub struct MessageBanner {
    text: Option<String>,
    clear_at: Option<Instant>,
    timeout: Duration,
}

impl MessageBanner {
    pub fn new(timeout: Duration) -> Self {
        MessageBanner {
            text: None,
            clear_at: None,
            timeout,
        }
    }

    pub fn show(&mut self, text: &str, now: Instant) {
        self.text = Some(text.to_owned());
        self.clear_at = Some(now + self.timeout);
    }

    /// Clears the message once its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(clear_at) = self.clear_at
            && now >= clear_at
        {
            self.text = None;
            self.clear_at = None;
        }
    }

    pub fn text(&self) -> Option<&str> { self.text.as_deref() }

    pub fn is_visible(&self) -> bool { self.text.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_expires_after_timeout() {
        let mut banner = MessageBanner::new(Duration::from_secs(3));
        let shown_at = Instant::now();
        banner.show("cannot select tiles from different lists", shown_at);
        banner.tick(shown_at + Duration::from_secs(1));
        assert!(banner.is_visible());
        banner.tick(shown_at + Duration::from_secs(4));
        assert!(!banner.is_visible());
        assert_eq!(banner.text(), None);
    }

    #[test]
    fn new_message_rearms_the_timer() {
        let mut banner = MessageBanner::new(Duration::from_secs(3));
        let first = Instant::now();
        banner.show("first", first);
        banner.show("second", first + Duration::from_secs(2));
        // The first message's deadline no longer clears anything.
        banner.tick(first + Duration::from_secs(3));
        assert_eq!(banner.text(), Some("second"));
        banner.tick(first + Duration::from_secs(5));
        assert!(!banner.is_visible());
    }
}
