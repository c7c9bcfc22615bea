//! The resolver pipeline: named, conditionally applied mutations of a freshly drawn node.
//!
//! Resolvers run in registration order. Each applicable resolver runs its `before`, `resolve` and `after` phases before
//! the next one starts. A failing phase skips the rest of that resolver only; it is logged and the pipeline continues.

use crate::{
	dom::NodeId,
	error::{ResolveError, ResolveErrorKind},
	model::ComponentRef,
	page::PageRef,
	Ndom,
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{trace, trace_span, warn};

pub mod builtin;

/// What a resolver operates on.
pub struct ResolveArgs<'a> {
	pub node: NodeId,
	pub component: &'a ComponentRef,
	pub page: &'a PageRef,
	pub ndom: &'a Ndom,
}

pub type ResolveFn = Rc<dyn Fn(&ResolveArgs<'_>) -> Result<(), ResolveErrorKind>>;
pub type Predicate = Rc<dyn Fn(&ResolveArgs<'_>) -> bool>;

/// When a resolver applies.
#[derive(Clone)]
pub enum Condition {
	Always,
	/// Only for components of this type.
	MatchType(String),
	Predicate(Predicate),
}

impl Condition {
	#[must_use]
	pub fn matches(&self, args: &ResolveArgs<'_>) -> bool {
		match self {
			Self::Always => true,
			Self::MatchType(component_type) => args.component.component_type() == *component_type,
			Self::Predicate(predicate) => predicate(args),
		}
	}
}

impl Debug for Condition {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Always => f.write_str("Always"),
			Self::MatchType(component_type) => f.debug_tuple("MatchType").field(component_type).finish(),
			Self::Predicate(_) => f.write_str("Predicate(..)"),
		}
	}
}

#[derive(Clone)]
pub struct Resolver {
	name: String,
	cond: Condition,
	before: Option<ResolveFn>,
	resolve: Option<ResolveFn>,
	after: Option<ResolveFn>,
}

impl Debug for Resolver {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolver").field("name", &self.name).field("cond", &self.cond).finish_non_exhaustive()
	}
}

impl Resolver {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			cond: Condition::Always,
			before: None,
			resolve: None,
			after: None,
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn cond(mut self, cond: Condition) -> Self {
		self.cond = cond;
		self
	}

	#[must_use]
	pub fn for_type(self, component_type: impl Into<String>) -> Self {
		self.cond(Condition::MatchType(component_type.into()))
	}

	#[must_use]
	pub fn when(self, predicate: impl Fn(&ResolveArgs<'_>) -> bool + 'static) -> Self {
		self.cond(Condition::Predicate(Rc::new(predicate)))
	}

	#[must_use]
	pub fn before(mut self, phase: impl Fn(&ResolveArgs<'_>) -> Result<(), ResolveErrorKind> + 'static) -> Self {
		self.before = Some(Rc::new(phase));
		self
	}

	#[must_use]
	pub fn resolve(mut self, phase: impl Fn(&ResolveArgs<'_>) -> Result<(), ResolveErrorKind> + 'static) -> Self {
		self.resolve = Some(Rc::new(phase));
		self
	}

	#[must_use]
	pub fn after(mut self, phase: impl Fn(&ResolveArgs<'_>) -> Result<(), ResolveErrorKind> + 'static) -> Self {
		self.after = Some(Rc::new(phase));
		self
	}

	#[must_use]
	pub fn applies(&self, args: &ResolveArgs<'_>) -> bool {
		self.cond.matches(args)
	}

	fn run(&self, args: &ResolveArgs<'_>) -> Result<(), ResolveErrorKind> {
		for phase in [&self.before, &self.resolve, &self.after].into_iter().flatten() {
			phase(args)?;
		}
		Ok(())
	}
}

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct ResolveReport {
	/// Names of the resolvers that applied, in order.
	pub ran: Vec<String>,
	pub errors: Vec<ResolveError>,
}

#[derive(Default, Clone)]
pub struct ResolverPipeline {
	resolvers: Vec<Rc<Resolver>>,
}

impl ResolverPipeline {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `resolver`, or replaces the resolver of the same name in place.
	pub fn register(&mut self, resolver: Resolver) {
		match self.resolvers.iter_mut().find(|existing| existing.name == resolver.name) {
			Some(existing) => {
				trace!("Replacing resolver {:?}.", resolver.name);
				*existing = Rc::new(resolver);
			}
			None => self.resolvers.push(Rc::new(resolver)),
		}
	}

	pub fn remove(&mut self, name: &str) -> bool {
		let before = self.resolvers.len();
		self.resolvers.retain(|resolver| resolver.name != name);
		before != self.resolvers.len()
	}

	pub(crate) fn snapshot(&self) -> Vec<Rc<Resolver>> {
		self.resolvers.clone()
	}

	#[must_use]
	pub fn names(&self) -> Vec<&str> {
		self.resolvers.iter().map(|resolver| resolver.name.as_str()).collect()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.resolvers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.resolvers.is_empty()
	}

	/// Runs every applicable resolver against `args`.
	#[must_use]
	pub fn run(&self, args: &ResolveArgs<'_>) -> ResolveReport {
		run_resolvers(&self.resolvers, args)
	}
}

pub(crate) fn run_resolvers(resolvers: &[Rc<Resolver>], args: &ResolveArgs<'_>) -> ResolveReport {
	let span = trace_span!("resolve", component = %args.component.id(), component_type = %args.component.component_type());
	let _enter = span.enter();
	let mut report = ResolveReport::default();
	for resolver in resolvers {
		if !resolver.applies(args) {
			continue;
		}
		report.ran.push(resolver.name.clone());
		if let Err(kind) = resolver.run(args) {
			let error = ResolveError { resolver: resolver.name.clone(), kind };
			warn!("{}", error);
			report.errors.push(error);
		}
	}
	report
}
