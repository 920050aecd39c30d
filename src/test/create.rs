use chrono::{TimeZone, Utc};
use entity::prelude::TestUser;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::{
    config::Config,
    definition::{DeclareRules, Factory},
    error::{BoxError, ConfigError, FactoryError},
    fixtures::Fixtures,
    test::{factory, model::User, setup},
};

/// Tests creating an instance through every lifecycle stage.
///
/// Verifies that the after-build hook sees the static `now` field, the before-create hook
/// derives the age before the insert, and the after-create hook only changes the returned
/// instance.
///
/// Expected: Ok with age 17 persisted and the nick name set on the instance only
#[tokio::test]
async fn creates_with_lifecycle_hooks() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();

    let birth_time = Utc.with_ymd_and_hms(2000, 11, 19, 0, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2017, 11, 19, 0, 0, 0).unwrap();
    let users = Factory::<User>::builder("test_user")
        .field("name", "test name")
        .sequence("id", 1, |n| Ok(n.into()))
        .field("now", now)
        .after_build(move |user| {
            user.birth_time = Some(birth_time);
            Ok(())
        })
        .before_create(|user| {
            let birth_time = user.birth_time.ok_or("birth time unset")?;
            user.age = ((user.now - birth_time).num_hours() / (24 * 365)) as i32;
            Ok(())
        })
        .after_create(|user| {
            user.nick_name = "nick name set by after-create".to_string();
            Ok(())
        })
        .build()?;

    let mut user = User::default();
    fixtures.create(&users).to(&mut user).await?;

    assert_eq!(user.id, 1);
    assert_eq!(user.name, "test name");
    assert_eq!(user.nick_name, "nick name set by after-create");
    assert_eq!(user.age, 17);
    assert_eq!(user.country, "");

    let row = TestUser::find_by_id(1).one(db).await?.unwrap();
    assert_eq!(row.name, "test name");
    assert_eq!(row.age, 17);
    assert_eq!(row.nick_name, "");
    assert_eq!(row.birth_time, Some(birth_time));

    Ok(())
}

/// Tests that consecutive creates draw consecutive sequence values.
///
/// Expected: Ok with ids 1, 2, 3 in call order
#[tokio::test]
async fn sequence_increments_across_calls() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = factory::users("test name");

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(fixtures.create(&users).await?.id);
    }

    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(TestUser::find().count(db).await?, 3);

    Ok(())
}

/// Tests that the store assigns the primary key when no rule sets it.
///
/// Expected: Ok with the auto-increment key written back into the instance
#[tokio::test]
async fn store_assigns_unset_primary_key() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = Factory::<User>::builder("test_user")
        .field("name", "keyless")
        .build()?;

    let first = fixtures.create(&users).await?;
    let second = fixtures.create(&users).await?;

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    let row = TestUser::find_by_id(2).one(db).await?.unwrap();
    assert_eq!(row.name, "keyless");

    Ok(())
}

/// Tests that transient fields are set but never persisted.
///
/// Expected: Ok with the override visible on the instance
#[tokio::test]
async fn transient_fields_stay_in_memory() -> Result<(), BoxError> {
    let (_test, fixtures) = setup().await?;
    let users = factory::users("test name");

    let user = fixtures
        .create(&users)
        .with_field("not_saved", "scratch")
        .await?;

    assert_eq!(user.not_saved, "scratch");

    Ok(())
}

/// Tests connecting a handle from configuration.
///
/// Verifies that a missing URL is reported and a configured one connects.
///
/// Expected: MissingEnvVar without a URL, a working handle with one
#[tokio::test]
async fn connects_from_config() -> Result<(), BoxError> {
    let result = Fixtures::connect(&Config::default()).await;
    assert!(matches!(
        result,
        Err(FactoryError::Config(ConfigError::MissingEnvVar(_)))
    ));

    let config = Config::default().database_url("sqlite::memory:").debug(true);
    let fixtures = Fixtures::connect(&config).await?;
    assert!(fixtures.config().debug);

    Ok(())
}

/// Tests installing the process-wide handle.
///
/// Expected: first install succeeds, the second fails with AlreadyInstalled
#[tokio::test]
async fn installs_process_handle_once() -> Result<(), BoxError> {
    let (_test, fixtures) = setup().await?;

    fixtures.clone().install()?;
    assert!(Fixtures::global().is_some());

    let second = fixtures.install();
    assert!(matches!(
        second,
        Err(FactoryError::Config(ConfigError::AlreadyInstalled))
    ));

    Ok(())
}
