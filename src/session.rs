//! Navigation state for the presentation layer.
//!
//! A `Session` is a plain value: each transition consumes it and hands back
//! the next one, so there is no shared mutable UI state.

use serde::Serialize;

use crate::events::Event;
use crate::services::cart::Cart;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Section {
    #[default]
    Dashboard,
    Products,
    Customers,
    Orders,
    Inventory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    active: Section,
    cart: Cart,
    dashboard_stale: bool,
    refresh_requested: bool,
}

impl Session {
    /// Starts on the dashboard with a refresh pending.
    pub fn new() -> Self {
        Self {
            refresh_requested: true,
            ..Self::default()
        }
    }

    pub fn active(&self) -> Section {
        self.active
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn dashboard_stale(&self) -> bool {
        self.dashboard_stale
    }

    /// Entering the dashboard always asks for fresh figures.
    pub fn navigate(self, section: Section) -> Self {
        Self {
            active: section,
            refresh_requested: self.refresh_requested || section == Section::Dashboard,
            ..self
        }
    }

    /// Marks the dashboard stale for events that change its figures. The
    /// refresh is requested right away only while the dashboard is showing.
    pub fn observe(self, event: &Event) -> Self {
        if !event.affects_dashboard() {
            return self;
        }
        Self {
            dashboard_stale: true,
            refresh_requested: self.refresh_requested || self.active == Section::Dashboard,
            ..self
        }
    }

    /// Takes the pending refresh request, clearing the stale flag with it.
    pub fn take_refresh(self) -> (Self, bool) {
        let requested = self.refresh_requested;
        let next = if requested {
            Self {
                dashboard_stale: false,
                refresh_requested: false,
                ..self
            }
        } else {
            self
        };
        (next, requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn starts_on_dashboard_wanting_data() {
        let (session, refresh) = Session::new().take_refresh();
        assert!(refresh);
        assert_eq!(session.active(), Section::Dashboard);
        assert!(!session.take_refresh().1);
    }

    #[test]
    fn changes_elsewhere_wait_for_the_dashboard() {
        let (session, _) = Session::new().take_refresh();
        let session = session
            .navigate(Section::Products)
            .observe(&Event::ProductCreated(11));

        assert!(session.dashboard_stale());
        let (session, refresh) = session.take_refresh();
        assert!(!refresh);

        let (session, refresh) = session.navigate(Section::Dashboard).take_refresh();
        assert!(refresh);
        assert!(!session.dashboard_stale());
    }

    #[test]
    fn changes_while_on_dashboard_refresh_immediately() {
        let (session, _) = Session::new().take_refresh();
        let (_, refresh) = session.observe(&Event::CustomerDeleted(3)).take_refresh();
        assert!(refresh);
    }

    #[test]
    fn cart_survives_navigation() {
        let mut session = Session::new().navigate(Section::Orders);
        session.cart_mut().push(1, "Air Max 270", dec!(5499.99), 1).unwrap();

        let session = session
            .navigate(Section::Inventory)
            .navigate(Section::Orders);
        assert_eq!(session.cart().len(), 1);
        assert_eq!(Section::from_str("inventory").unwrap(), Section::Inventory);
    }
}
