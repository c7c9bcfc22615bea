use crate::{
	dom::DomEvent,
	resolver::Resolver,
};
use serde_json::Value;
use std::rc::Rc;
use tracing::{trace, warn};

/// Attaches a DOM listener for every user event (`onClick`, ...) the component carries an action chain for.
///
/// Attachment is deferred by [`Config::user_event_delay`](`crate::Config::user_event_delay`) so the listeners never
/// observe the data updates of the draw that created them.
pub(super) fn events() -> Resolver {
	Resolver::new("events").resolve(|args| {
		let bindings: Vec<(String, String)> = args
			.ndom
			.config()
			.event_map
			.iter()
			.filter(|(user_event, _)| !matches!(args.component.get(user_event), None | Some(Value::Null)))
			.cloned()
			.collect();
		if bindings.is_empty() {
			return Ok(());
		}

		let ndom = args.ndom.downgrade();
		let component = Rc::downgrade(args.component);
		let node = args.node;
		args.ndom.platform().set_timeout(
			args.ndom.config().user_event_delay,
			Box::new(move || {
				let Some(document) = ndom.upgrade().map(|ndom| ndom.document().clone()) else { return };
				for (user_event, dom_event) in bindings {
					let ndom = ndom.clone();
					let component = component.clone();
					let listener = Rc::new(move |event: &DomEvent| {
						let (Some(ndom), Some(component)) = (ndom.upgrade(), component.upgrade()) else { return };
						trace!(component = %component.id(), %user_event, "User event.");
						let user_event = user_event.clone();
						let execution = component.execute(&user_event, event);
						ndom.platform().spawn_local(Box::pin(async move {
							if let Err(error) = execution.await {
								warn!("{} failed: {}", user_event, error);
							}
						}));
					});
					let attached = document.borrow_mut().add_event_listener(node, &dom_event, listener);
					if let Err(error) = attached {
						trace!("Listener not attached: {}", error);
					}
				}
			}),
		);
		Ok(())
	})
}
