//! Persistence coordinator.
//!
//! `Fixtures` ties a store adapter, a sequence registry and the process configuration together
//! and drives every call against them:
//!
//! - `build` resolves an instance through its after-build hooks. Related records are created,
//!   the instance itself is not persisted.
//! - `create` additionally runs before-create hooks, inserts the instance, writes the
//!   store-assigned primary key back and runs after-create hooks.
//! - `create_slice` runs `create` a fixed number of times, stopping at the first failure.
//! - `delete` removes one instance by primary key without cascading.
//!
//! Each call is one future driven by the caller; nothing is spawned in the background and no
//! instance is cached between calls. Nothing persisted is rolled back on failure.
//!
//! # Example
//!
//! ```rust,ignore
//! let fixtures = Fixtures::new(db.clone());
//!
//! let blog = fixtures.create(&blogs).with_field("id", 2).await?;
//!
//! let mut stars: Vec<Box<Star>> = Vec::new();
//! fixtures.create_slice(&star_factory, 3).to(&mut stars).await?;
//!
//! fixtures.delete(&blogs, &blog).await?;
//! ```

use std::{
    future::IntoFuture,
    sync::{Arc, OnceLock},
};

use futures::future::BoxFuture;

use crate::{
    build::{self, Resolved},
    config::Config,
    definition::{hook::run_stage, Factory, HookStage},
    error::{ConfigError, CreateSliceError, DefinitionError, FactoryError, StoreError},
    model::{FieldDef, Model},
    options::CallOptions,
    sequence::SequenceRegistry,
    store::Store,
    value::Value,
};

static GLOBAL: OnceLock<Fixtures> = OnceLock::new();

/// Handle used to build, create and delete fixtures.
#[derive(Clone)]
pub struct Fixtures {
    store: Arc<dyn Store>,
    sequences: Arc<SequenceRegistry>,
    config: Arc<Config>,
}

impl Fixtures {
    /// Creates a handle with default configuration and a fresh sequence registry.
    pub fn new(store: impl Store + 'static) -> Self {
        Self::with_config(store, Config::default())
    }

    /// Creates a handle with the given configuration and a fresh sequence registry.
    pub fn with_config(store: impl Store + 'static, config: Config) -> Self {
        Self::with_sequences(store, config, Arc::new(SequenceRegistry::new()))
    }

    /// Creates a handle sharing an existing sequence registry.
    ///
    /// Handles sharing a registry never hand out the same sequence value twice for a factory
    /// field, even when they talk to different stores.
    pub fn with_sequences(
        store: impl Store + 'static,
        config: Config,
        sequences: Arc<SequenceRegistry>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            sequences,
            config: Arc::new(config),
        }
    }

    /// Connects to the configured database.
    ///
    /// # Arguments
    /// - `config` - Configuration holding the database URL
    ///
    /// # Returns
    /// - `Ok(Fixtures)` - Handle backed by a SeaORM connection
    /// - `Err(FactoryError::Config)` - No database URL configured
    /// - `Err(FactoryError::Store)` - Connection failed
    pub async fn connect(config: &Config) -> Result<Self, FactoryError> {
        let url = config.require_database_url()?;
        let db = sea_orm::Database::connect(url)
            .await
            .map_err(StoreError::from)?;

        tracing::debug!(debug = config.debug, "fixtures connected");

        Ok(Self::with_config(db, config.clone()))
    }

    /// Installs this handle as the process-wide one.
    ///
    /// # Returns
    /// - `Ok(())` - Handle installed
    /// - `Err(FactoryError::Config)` - A handle was installed before
    pub fn install(self) -> Result<(), FactoryError> {
        GLOBAL
            .set(self)
            .map_err(|_| ConfigError::AlreadyInstalled)?;
        Ok(())
    }

    /// The process-wide handle, if one was installed.
    pub fn global() -> Option<&'static Fixtures> {
        GLOBAL.get()
    }

    pub fn sequences(&self) -> &SequenceRegistry {
        &self.sequences
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts a create call.
    pub fn create<'a, M: Model>(&'a self, factory: &'a Factory<M>) -> Create<'a, M> {
        Create {
            fixtures: self,
            factory,
            options: CallOptions::new(),
        }
    }

    /// Starts a build call: associations are persisted, the instance itself is not.
    pub fn build<'a, M: Model>(&'a self, factory: &'a Factory<M>) -> Build<'a, M> {
        Build {
            fixtures: self,
            factory,
            options: CallOptions::new(),
        }
    }

    /// Starts a call creating `count` instances with the same options.
    pub fn create_slice<'a, M: Model>(
        &'a self,
        factory: &'a Factory<M>,
        count: usize,
    ) -> CreateSlice<'a, M> {
        CreateSlice {
            fixtures: self,
            factory,
            count,
            options: CallOptions::new(),
        }
    }

    /// Deletes an instance by its primary key.
    ///
    /// Associated records are left in place.
    ///
    /// # Returns
    /// - `Ok(())` - Row removed
    /// - `Err(FactoryError::Store)` - Primary key unset, no such row, or the delete failed
    pub async fn delete<M: Model>(
        &self,
        factory: &Factory<M>,
        instance: &M,
    ) -> Result<(), FactoryError> {
        let (field, column) = primary_key(factory)?;
        let key = field.get(instance);
        if key.is_unset() {
            return Err(StoreError::MissingKey {
                table: factory.table().to_string(),
                field: field.name().to_string(),
            }
            .into());
        }

        if self.config.debug {
            tracing::info!(table = %factory.table(), key = %key, "deleting fixture");
        } else {
            tracing::debug!(table = %factory.table(), key = %key, "deleting fixture");
        }

        self.store.delete_row(factory.table(), column, key).await?;
        Ok(())
    }

    /// Resolves, persists and runs the create hooks of one instance.
    ///
    /// Also used by associations to create related records.
    pub(crate) fn create_with<'a, M: Model>(
        &'a self,
        factory: &'a Factory<M>,
        options: &'a CallOptions,
    ) -> BoxFuture<'a, Result<M, FactoryError>> {
        Box::pin(async move {
            let Resolved {
                mut instance,
                hooks,
            } = build::resolve(factory, options, self).await?;

            run_stage(&hooks, HookStage::BeforeCreate, &mut instance, self).await?;
            self.insert(factory, &mut instance).await?;
            run_stage(&hooks, HookStage::AfterCreate, &mut instance, self).await?;

            Ok(instance)
        })
    }

    async fn insert<M: Model>(
        &self,
        factory: &Factory<M>,
        instance: &mut M,
    ) -> Result<(), FactoryError> {
        let (field, column) = primary_key(factory)?;
        let assign_key = field.get(instance).is_unset();
        let row = factory.schema().row(instance, assign_key);

        if self.config.debug {
            tracing::info!(
                table = %factory.table(),
                columns = row.len(),
                assign_key,
                "inserting fixture"
            );
        } else {
            tracing::debug!(
                table = %factory.table(),
                columns = row.len(),
                assign_key,
                "inserting fixture"
            );
        }

        let key = self.store.insert_row(factory.table(), column, &row).await?;
        field
            .set(instance, key)
            .map_err(|source| FactoryError::InvalidValue {
                field: field.name().to_string(),
                source,
            })
    }
}

/// Primary-key field of a factory's model and the column it is stored in.
fn primary_key<M>(
    factory: &Factory<M>,
) -> Result<(&FieldDef<M>, &'static str), FactoryError> {
    let field = factory
        .schema()
        .primary_key_field()
        .ok_or_else(|| DefinitionError::MissingPrimaryKey {
            table: factory.table().to_string(),
        })?;
    Ok((field, field.column().unwrap_or(field.name())))
}

/// Adds the shared call-option setters to a call builder.
macro_rules! call_options {
    ($builder:ident) => {
        impl<'a, M: Model> $builder<'a, M> {
            /// Overrides a field; wins over every base and trait rule.
            pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
                self.options = self.options.with_field(name, value);
                self
            }

            /// Selects traits, applied in the given order.
            pub fn with_traits<I, S>(mut self, traits: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.options = self.options.with_traits(traits);
                self
            }

            /// Reuses `related` for the named association instead of creating a record.
            pub fn with_related<R: Model>(
                mut self,
                association: impl Into<String>,
                related: R,
            ) -> Self {
                self.options = self.options.with_related(association, related);
                self
            }

            /// Appends a prepared option bundle.
            pub fn options(mut self, options: CallOptions) -> Self {
                self.options = self.options.merge(options);
                self
            }
        }
    };
}

/// Pending create call. Await it, or finish it with `to`.
#[must_use = "a create call does nothing until awaited"]
pub struct Create<'a, M> {
    fixtures: &'a Fixtures,
    factory: &'a Factory<M>,
    options: CallOptions,
}

call_options!(Create);

impl<'a, M: Model> Create<'a, M> {
    /// Creates the instance and writes it into `dest`.
    pub async fn to(self, dest: &mut M) -> Result<(), FactoryError> {
        *dest = self.await?;
        Ok(())
    }
}

impl<'a, M: Model> IntoFuture for Create<'a, M> {
    type Output = Result<M, FactoryError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.fixtures.create_with(self.factory, &self.options).await })
    }
}

/// Pending build call. Await it, or finish it with `to`.
#[must_use = "a build call does nothing until awaited"]
pub struct Build<'a, M> {
    fixtures: &'a Fixtures,
    factory: &'a Factory<M>,
    options: CallOptions,
}

call_options!(Build);

impl<'a, M: Model> Build<'a, M> {
    /// Builds the instance and writes it into `dest`.
    pub async fn to(self, dest: &mut M) -> Result<(), FactoryError> {
        *dest = self.await?;
        Ok(())
    }
}

impl<'a, M: Model> IntoFuture for Build<'a, M> {
    type Output = Result<M, FactoryError>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let resolved = build::resolve(self.factory, &self.options, self.fixtures).await?;
            Ok(resolved.instance)
        })
    }
}

/// Upper bound on the capacity reserved up front; larger slices grow as they are created.
const SLICE_RESERVE_LIMIT: usize = 1024;

/// Pending create-slice call. Await it, or finish it with `to`.
#[must_use = "a create_slice call does nothing until awaited"]
pub struct CreateSlice<'a, M> {
    fixtures: &'a Fixtures,
    factory: &'a Factory<M>,
    count: usize,
    options: CallOptions,
}

call_options!(CreateSlice);

impl<'a, M: Model> CreateSlice<'a, M> {
    /// Creates the instances into an empty destination.
    ///
    /// Works for any element type built from the model, such as `M`, `Box<M>` or `Arc<M>`.
    /// On failure the instances created so far stay in `dest`.
    ///
    /// # Returns
    /// - `Ok(())` - `dest` holds `count` instances in creation order
    /// - `Err(FactoryError::NonEmptyDestination)` - `dest` was not empty; nothing was created
    /// - `Err(FactoryError)` - Creating an element failed
    pub async fn to<D: From<M>>(self, dest: &mut Vec<D>) -> Result<(), FactoryError> {
        if !dest.is_empty() {
            return Err(FactoryError::NonEmptyDestination { len: dest.len() });
        }
        dest.reserve(self.count.min(SLICE_RESERVE_LIMIT));
        self.fill(dest).await
    }

    async fn fill<D: From<M>>(&self, dest: &mut Vec<D>) -> Result<(), FactoryError> {
        for index in 0..self.count {
            tracing::debug!(
                table = %self.factory.table(),
                index,
                count = self.count,
                "creating slice element"
            );
            let instance = self.fixtures.create_with(self.factory, &self.options).await?;
            dest.push(D::from(instance));
        }
        Ok(())
    }
}

impl<'a, M: Model> IntoFuture for CreateSlice<'a, M> {
    type Output = Result<Vec<M>, CreateSliceError<M>>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            let mut created = Vec::with_capacity(self.count.min(SLICE_RESERVE_LIMIT));
            match self.fill(&mut created).await {
                Ok(()) => Ok(created),
                Err(source) => Err(CreateSliceError { created, source }),
            }
        })
    }
}
