//! [`Notification`] definitions.

use crate::domain::{booking, user};

/// Email notification addressed to a single recipient.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    /// [`user::Email`] of the recipient.
    pub recipient: user::Email,

    /// [`Event`] this [`Notification`] informs about.
    pub event: Event,
}

/// Event a [`Notification`] informs about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// A guest's booking has been created.
    BookingConfirmation {
        /// ID of the created booking.
        booking_id: booking::Id,
    },

    /// A listing of a host has been booked.
    HostNotification {
        /// ID of the created booking.
        booking_id: booking::Id,

        /// Name of the guest who made the booking.
        guest_name: String,
    },

    /// A booking has been paid.
    PaymentConfirmation {
        /// ID of the paid booking.
        booking_id: booking::Id,
    },

    /// A new user has signed up.
    Welcome {
        /// Username of the new user.
        username: user::Username,
    },
}

impl Notification {
    /// Returns the subject line of this [`Notification`].
    #[must_use]
    pub fn subject(&self) -> &'static str {
        match self.event {
            Event::BookingConfirmation { .. } => "Booking Confirmation",
            Event::HostNotification { .. } => "New Booking on Your Listing",
            Event::PaymentConfirmation { .. } => "Payment Successful",
            Event::Welcome { .. } => "Welcome to ALX Travel",
        }
    }

    /// Renders the plain text body of this [`Notification`].
    #[must_use]
    pub fn body(&self) -> String {
        match &self.event {
            Event::BookingConfirmation { booking_id } => format!(
                "Your booking with ID {booking_id} has been created \
                 successfully!",
            ),
            Event::HostNotification {
                booking_id,
                guest_name,
            } => format!(
                "You have a new booking (ID {booking_id}) from {guest_name}.",
            ),
            Event::PaymentConfirmation { booking_id } => format!(
                "Your payment for booking {booking_id} was successful.",
            ),
            Event::Welcome { username } => format!(
                "Hi {username}, your account has been created successfully!",
            ),
        }
    }
}

#[cfg(test)]
mod spec {
    use uuid::Uuid;

    use crate::domain::{booking, user};

    use super::{Event, Notification};

    fn to(event: Event) -> Notification {
        Notification {
            recipient: user::Email::new("guest@example.com").unwrap(),
            event,
        }
    }

    #[test]
    fn renders_templates() {
        let booking_id = booking::Id::from(Uuid::nil());

        let n = to(Event::BookingConfirmation { booking_id });
        assert_eq!(n.subject(), "Booking Confirmation");
        assert_eq!(
            n.body(),
            "Your booking with ID 00000000-0000-0000-0000-000000000000 has \
             been created successfully!",
        );

        let n = to(Event::HostNotification {
            booking_id,
            guest_name: "Abebe Bikila".into(),
        });
        assert_eq!(n.subject(), "New Booking on Your Listing");
        assert_eq!(
            n.body(),
            "You have a new booking (ID 00000000-0000-0000-0000-000000000000) \
             from Abebe Bikila.",
        );

        let n = to(Event::PaymentConfirmation { booking_id });
        assert_eq!(n.subject(), "Payment Successful");
        assert_eq!(
            n.body(),
            "Your payment for booking 00000000-0000-0000-0000-000000000000 \
             was successful.",
        );

        let n = to(Event::Welcome {
            username: user::Username::new("abebe").unwrap(),
        });
        assert_eq!(n.subject(), "Welcome to ALX Travel");
        assert_eq!(
            n.body(),
            "Hi abebe, your account has been created successfully!",
        );
    }
}
