//! Lifecycle hooks.
//!
//! Hooks run at three stages of a create call:
//!
//! 1. **after-build** - the instance is fully resolved, associations included, nothing of the
//!    owner is persisted yet
//! 2. **before-create** - right before the owner row is inserted
//! 3. **after-create** - after the insert, with the store-assigned primary key in place
//!
//! Within a stage hooks run in registration order: the base definition's hooks first, then
//! those of each selected trait in selection order. The first failing hook stops the stage and
//! the whole call.

use std::{fmt, sync::Arc};

use futures::future::BoxFuture;

use crate::{
    error::{BoxError, FactoryError},
    fixtures::Fixtures,
};

/// Stage of the create lifecycle a hook is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    AfterBuild,
    BeforeCreate,
    AfterCreate,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookStage::AfterBuild => "after-build",
            HookStage::BeforeCreate => "before-create",
            HookStage::AfterCreate => "after-create",
        })
    }
}

type SyncHook<M> = Arc<dyn Fn(&mut M) -> Result<(), BoxError> + Send + Sync>;
type AsyncHook<M> = Arc<
    dyn for<'a> Fn(&'a mut M, &'a Fixtures) -> BoxFuture<'a, Result<(), BoxError>>
        + Send
        + Sync,
>;

/// A single lifecycle callback.
pub enum Hook<M> {
    /// Plain callback mutating the instance.
    Sync(SyncHook<M>),
    /// Callback that may create further records through the `Fixtures` handle.
    Async(AsyncHook<M>),
}

impl<M> Clone for Hook<M> {
    fn clone(&self) -> Self {
        match self {
            Hook::Sync(hook) => Hook::Sync(Arc::clone(hook)),
            Hook::Async(hook) => Hook::Async(Arc::clone(hook)),
        }
    }
}

impl<M> Hook<M> {
    async fn call(&self, instance: &mut M, fixtures: &Fixtures) -> Result<(), BoxError> {
        match self {
            Hook::Sync(hook) => hook(instance),
            Hook::Async(hook) => hook(instance, fixtures).await,
        }
    }
}

/// Hooks of one rule set, grouped by stage.
pub struct HookSet<M> {
    after_build: Vec<Hook<M>>,
    before_create: Vec<Hook<M>>,
    after_create: Vec<Hook<M>>,
}

impl<M> Default for HookSet<M> {
    fn default() -> Self {
        Self {
            after_build: Vec::new(),
            before_create: Vec::new(),
            after_create: Vec::new(),
        }
    }
}

impl<M> HookSet<M> {
    pub(crate) fn push(&mut self, stage: HookStage, hook: Hook<M>) {
        self.stage_mut(stage).push(hook);
    }

    /// Hooks registered for a stage, in registration order.
    pub fn stage(&self, stage: HookStage) -> &[Hook<M>] {
        match stage {
            HookStage::AfterBuild => &self.after_build,
            HookStage::BeforeCreate => &self.before_create,
            HookStage::AfterCreate => &self.after_create,
        }
    }

    fn stage_mut(&mut self, stage: HookStage) -> &mut Vec<Hook<M>> {
        match stage {
            HookStage::AfterBuild => &mut self.after_build,
            HookStage::BeforeCreate => &mut self.before_create,
            HookStage::AfterCreate => &mut self.after_create,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.after_build.is_empty() && self.before_create.is_empty() && self.after_create.is_empty()
    }
}

/// Runs the hooks of `stage` from each set in order, stopping at the first failure.
///
/// # Arguments
/// - `sets` - Base hook set followed by the selected traits' hook sets
/// - `stage` - Stage to run
/// - `instance` - Instance handed to every hook
/// - `fixtures` - Handle passed to asynchronous hooks
///
/// # Returns
/// - `Ok(())` - Every hook succeeded
/// - `Err(FactoryError::Hook)` - A hook failed; later hooks did not run
pub(crate) async fn run_stage<M>(
    sets: &[&HookSet<M>],
    stage: HookStage,
    instance: &mut M,
    fixtures: &Fixtures,
) -> Result<(), FactoryError> {
    for hook in sets.iter().flat_map(|set| set.stage(stage)) {
        hook.call(instance, fixtures)
            .await
            .map_err(|source| FactoryError::Hook { stage, source })?;
    }

    Ok(())
}
