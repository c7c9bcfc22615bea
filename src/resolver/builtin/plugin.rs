use super::set_attribute;
use crate::{
	resolver::Resolver,
	transaction::{PluginLocation, PluginRequest},
};
use tracing::{trace, warn};

#[must_use]
pub fn is_plugin(component_type: &str) -> bool {
	matches!(component_type, "plugin" | "pluginHead" | "pluginBodyTop" | "pluginBodyTail")
}

/// Plugins mount themselves at their location, once their content is available.
///
/// With a `LOAD_PLUGIN` transaction, the content is requested first and inserted inline (or through `src` if the
/// transaction yields nothing). Without one, the node is inserted right away with its `src`.
pub(super) fn plugin() -> Resolver {
	Resolver::new("plugin").when(|args| is_plugin(&args.component.component_type())).resolve(|args| {
		let path = args.component.get_str("data-src").or_else(|| args.component.get_str("path")).unwrap_or_default();
		let location = PluginLocation::from_component(&args.component.component_type(), args.component.get_str("location").as_deref());
		let Some(load) = args.ndom.transactions().load_plugin() else {
			if !path.is_empty() {
				set_attribute(args, "src", &path)?;
			}
			args.ndom.mount_plugin(args.node, location, args.page)?;
			return Ok(());
		};

		let request = PluginRequest { component_id: args.component.id(), path: path.clone(), location };
		let ndom = args.ndom.downgrade();
		let page = std::rc::Rc::downgrade(args.page);
		let node = args.node;
		let loading = load(request);
		args.ndom.platform().spawn_local(Box::pin(async move {
			let content = loading.await;
			let (Some(ndom), Some(page)) = (ndom.upgrade(), page.upgrade()) else { return };
			let prepared = match content {
				Ok(Some(content)) => ndom.document().borrow_mut().set_text_content(node, &content),
				Ok(None) if !path.is_empty() => ndom.document().borrow_mut().set_attribute(node, "src", &path),
				Ok(None) => Ok(()),
				Err(error) => {
					warn!("Plugin {} failed to load: {}", path, error);
					return;
				}
			};
			match prepared.and_then(|()| ndom.mount_plugin(node, location, &page)) {
				Ok(()) => trace!(%path, ?location, "Plugin mounted."),
				Err(error) => warn!("Failed to mount plugin {}: {}", path, error),
			}
		}));
		Ok(())
	})
}
