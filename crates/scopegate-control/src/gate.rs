//! Gate predicates evaluated by a dispatch layer before routing an event

use std::sync::Arc;

use async_trait::async_trait;
use scopegate_common::MANAGER_STATE_KEY;
use tracing::warn;

use crate::context::EventContext;
use crate::control::Control;
use crate::scope::Scope;

/// Predicate over an inbound event
#[async_trait]
pub trait Rule: Send + Sync {
    async fn check(&self, ctx: &mut EventContext) -> bool;
}

/// Gate derived from a [`Control`] via [`Control::handler`].
///
/// Records the control in the event state under `"manager"` so later handlers
/// know which service the event was routed to, then admits the event when the
/// service is enabled in the event's scope.
#[derive(Debug, Clone)]
pub struct ControlGate {
    control: Arc<Control>,
}

impl ControlGate {
    pub fn new(control: Arc<Control>) -> Self {
        Self { control }
    }

    pub fn control(&self) -> &Arc<Control> {
        &self.control
    }
}

#[async_trait]
impl Rule for ControlGate {
    async fn check(&self, ctx: &mut EventContext) -> bool {
        ctx.insert_state(MANAGER_STATE_KEY, Arc::clone(&self.control));

        let Some(scope) = Scope::for_event(&ctx.event) else {
            warn!(
                service = self.control.service(),
                group_id = ctx.event.group_id,
                user_id = ctx.event.user_id,
                "Event has no scope, rejecting"
            );
            return false;
        };

        self.control.is_enabled_in(scope).await
    }
}

/// Evaluate rules in order, stopping at the first rejection
pub async fn check_all(rules: &[&dyn Rule], ctx: &mut EventContext) -> bool {
    for rule in rules {
        if !rule.check(ctx).await {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Event;
    use crate::control::ControlOptions;
    use crate::registry::ControlRegistry;
    use scopegate_persistence::MemoryScopeStore;

    struct Deny;

    #[async_trait]
    impl Rule for Deny {
        async fn check(&self, _ctx: &mut EventContext) -> bool {
            false
        }
    }

    fn registry() -> ControlRegistry {
        ControlRegistry::new(Arc::new(MemoryScopeStore::new()))
    }

    #[tokio::test]
    async fn test_gate_records_control() {
        let registry = registry();
        let control = registry
            .register("weather", ControlOptions::new())
            .await
            .unwrap();
        let gate = control.handler();

        let mut ctx = EventContext::new(Event::group(555, 42));
        assert!(gate.check(&mut ctx).await);

        let recorded = ctx.control().unwrap();
        assert!(Arc::ptr_eq(&recorded, &control));
    }

    #[tokio::test]
    async fn test_gate_private_scope_is_negated_user() {
        let registry = registry();
        let control = registry
            .register("weather", ControlOptions::new())
            .await
            .unwrap();
        control.disable(Scope::Individual(42)).await;

        let mut ctx = EventContext::new(Event::private(42));
        assert!(!control.handler().check(&mut ctx).await);

        // Group 42 is a different scope
        let mut ctx = EventContext::new(Event::group(42, 7));
        assert!(control.handler().check(&mut ctx).await);
    }

    #[tokio::test]
    async fn test_gate_rejects_scopeless_event() {
        let registry = registry();
        let control = registry
            .register("weather", ControlOptions::new())
            .await
            .unwrap();

        let mut ctx = EventContext::new(Event::default());
        assert!(!control.handler().check(&mut ctx).await);
        assert!(ctx.control().is_some());
        assert!(control.rows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_all_short_circuits() {
        let registry = registry();
        let control = registry
            .register("weather", ControlOptions::new())
            .await
            .unwrap();
        let gate = control.handler();

        let mut ctx = EventContext::new(Event::group(1, 2));
        assert!(!check_all(&[&Deny, &gate], &mut ctx).await);
        // The gate never ran, so nothing was recorded or written back
        assert!(ctx.control().is_none());
        assert_eq!(control.state_in(Scope::Group(1)).await, None);

        assert!(check_all(&[&gate], &mut ctx).await);
    }
}
