use super::{Listener, ListenerId, NodeId};
use hashbrown::{hash_map::Entry, HashMap};
use tracing::{error, trace};
use wasm_bindgen::closure::Closure;

pub(crate) struct PublishedListener {
	pub node: NodeId,
	pub event: String,
	pub listener: Listener,
	pub closure: Closure<dyn Fn(web_sys::Event)>,
}

/// Keeps the JavaScript closures of registered listeners alive until they are unpublished.
#[derive(Default)]
pub(crate) struct ClosureMap {
	closures: HashMap<ListenerId, PublishedListener>,
	next: u32,
}

impl ClosureMap {
	pub fn next_id(&mut self) -> ListenerId {
		let id = ListenerId(self.next);
		self.next += 1;
		id
	}

	pub fn publish(&mut self, id: ListenerId, published: PublishedListener) -> &PublishedListener {
		match self.closures.entry(id) {
			Entry::Vacant(vacant) => {
				trace!("Created Closure.");
				vacant.insert(published)
			}
			Entry::Occupied(occupied) => {
				error!("Listener {:?} was published twice; keeping the first closure.", id);
				occupied.into_mut()
			}
		}
	}

	pub fn unpublish(&mut self, id: ListenerId) -> Option<PublishedListener> {
		let published = self.closures.remove(&id);
		if published.is_some() {
			trace!("Destroyed Closure.");
		}
		published
	}

	pub fn listeners(&self, node: NodeId, event: &str) -> Vec<(ListenerId, Listener)> {
		let mut found: Vec<_> = self.closures.iter().filter(|(_, p)| p.node == node && p.event == event).map(|(&id, p)| (id, p.listener.clone())).collect();
		found.sort_by_key(|(id, _)| id.0);
		found
	}

	pub fn len(&self) -> usize {
		self.closures.len()
	}
}
