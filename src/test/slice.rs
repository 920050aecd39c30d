use entity::prelude::TestUser;
use sea_orm::{EntityTrait, PaginatorTrait};

use crate::{
    definition::{DeclareRules, Factory, HookStage},
    error::{BoxError, FactoryError},
    test::{factory, model::User, setup},
};

/// Tests creating slices into boxed and plain destinations.
///
/// Verifies that both slices share the sequence counter, so the second slice continues where
/// the first stopped.
///
/// Expected: ids 1-3 in the boxed slice, 4-6 in the plain one
#[tokio::test]
async fn creates_consecutive_slices() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = factory::users("test create slice name");

    let mut boxed: Vec<Box<User>> = Vec::new();
    fixtures.create_slice(&users, 3).to(&mut boxed).await?;

    assert_eq!(boxed.len(), 3);
    for (i, user) in boxed.iter().enumerate() {
        assert_eq!(user.id, i as i32 + 1);
        assert_eq!(user.name, "test create slice name");
    }

    let plain = fixtures.create_slice(&users, 3).await?;

    assert_eq!(plain.iter().map(|user| user.id).collect::<Vec<_>>(), vec![4, 5, 6]);
    assert_eq!(TestUser::find().count(db).await?, 6);

    Ok(())
}

/// Tests that a slice of zero creates nothing.
///
/// Expected: Ok with an empty slice
#[tokio::test]
async fn empty_slice_creates_nothing() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = factory::users("test name");

    let created = fixtures.create_slice(&users, 0).await?;

    assert!(created.is_empty());
    assert_eq!(TestUser::find().count(db).await?, 0);

    Ok(())
}

/// Tests that a non-empty destination is rejected before anything is created.
///
/// Expected: NonEmptyDestination error and no user rows
#[tokio::test]
async fn rejects_non_empty_destination() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = factory::users("test name");

    let mut existing = vec![User::default()];
    let result = fixtures.create_slice(&users, 2).to(&mut existing).await;

    assert!(matches!(
        result,
        Err(FactoryError::NonEmptyDestination { len: 1 })
    ));
    assert_eq!(existing.len(), 1);
    assert_eq!(TestUser::find().count(db).await?, 0);

    Ok(())
}

/// Tests that a slice stops at the first failing element.
///
/// Verifies that the elements created before the failure are handed back, through the error
/// when awaited and through the destination with `to`, and stay persisted.
///
/// Expected: two created users per call, the before-create failure as the cause
#[tokio::test]
async fn stops_at_first_failure() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = Factory::<User>::builder("test_user")
        .sequence("id", 1, |n| Ok(n.into()))
        .before_create(|user| {
            if user.id % 3 == 0 {
                return Err(format!("user {} rejected", user.id).into());
            }
            Ok(())
        })
        .build()?;

    let err = fixtures.create_slice(&users, 5).await.unwrap_err();
    assert_eq!(
        err.created.iter().map(|user| user.id).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(matches!(
        err.source,
        FactoryError::Hook {
            stage: HookStage::BeforeCreate,
            ..
        }
    ));

    let mut dest: Vec<User> = Vec::new();
    let result = fixtures.create_slice(&users, 5).to(&mut dest).await;
    assert!(result.is_err());
    assert_eq!(dest.iter().map(|user| user.id).collect::<Vec<_>>(), vec![4, 5]);

    assert_eq!(TestUser::find().count(db).await?, 4);

    Ok(())
}

/// Tests that a very large count fails on its first element instead of allocating up front.
///
/// Expected: the before-create failure with no created users, for both await and `to`
#[tokio::test]
async fn huge_count_fails_on_first_element() -> Result<(), BoxError> {
    let (test, fixtures) = setup().await?;
    let db = test.db.as_ref().unwrap();
    let users = Factory::<User>::builder("test_user")
        .sequence("id", 1, |n| Ok(n.into()))
        .before_create(|_| Err("every user rejected".into()))
        .build()?;

    let err = fixtures.create_slice(&users, usize::MAX / 2).await.unwrap_err();
    assert!(err.created.is_empty());
    assert!(matches!(
        err.source,
        FactoryError::Hook {
            stage: HookStage::BeforeCreate,
            ..
        }
    ));

    let mut dest: Vec<Box<User>> = Vec::new();
    let result = fixtures.create_slice(&users, usize::MAX).to(&mut dest).await;
    assert!(matches!(
        result,
        Err(FactoryError::Hook {
            stage: HookStage::BeforeCreate,
            ..
        })
    ));
    assert!(dest.is_empty());
    assert_eq!(TestUser::find().count(db).await?, 0);

    Ok(())
}
