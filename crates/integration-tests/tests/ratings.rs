//! Rating aggregation and the one-rating-per-pair rule.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::task::JoinSet;

use store_ratings_core::{Email, Field, Role, Score, ValidationError};
use store_ratings_integration_tests::{rate, store, user};
use store_ratings_server::db::RepositoryError;
use store_ratings_server::services::{RatingService, ServiceError, StoreService};

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_average_and_total_follow_scores(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let store_id = store(&pool, &admin, &owner, "Corner Bakery and Coffee House").await;

    for (email, score) in [("a@example.com", 3), ("b@example.com", 5), ("c@example.com", 4)] {
        let (_, rater) = user(&pool, email, Role::NormalUser).await;
        rate(&pool, &rater, store_id, score).await;
    }

    let summary = StoreService::new(&pool)
        .get_with_summary(None, store_id)
        .await
        .unwrap();
    assert_eq!(summary.average_rating, Decimal::from(4));
    assert_eq!(summary.total_ratings, 3);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_unrated_store_reports_zero(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let store_id = store(&pool, &admin, &owner, "Quiet Hardware and Garden").await;

    let summary = StoreService::new(&pool)
        .get_with_summary(None, store_id)
        .await
        .unwrap();
    assert_eq!(summary.average_rating, Decimal::ZERO);
    assert_eq!(summary.total_ratings, 0);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_second_strict_insert_is_duplicate(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let (_, rater) = user(&pool, "rater@example.com", Role::NormalUser).await;
    let store_id = store(&pool, &admin, &owner, "Corner Bakery and Coffee House").await;

    let service = RatingService::new(&pool);
    let score = Score::try_from(4_i64).unwrap();
    service.create(&rater, store_id, score).await.unwrap();

    let err = service.create(&rater, store_id, score).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::DuplicateRating)
    ));
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_upsert_replaces_existing_score(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let (_, rater) = user(&pool, "rater@example.com", Role::NormalUser).await;
    let store_id = store(&pool, &admin, &owner, "Corner Bakery and Coffee House").await;

    rate(&pool, &rater, store_id, 4).await;
    rate(&pool, &rater, store_id, 5).await;

    let ratings = RatingService::new(&pool)
        .list_for_store(None, store_id)
        .await
        .unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings.first().unwrap().rating.score.get(), 5);

    let summary = StoreService::new(&pool)
        .get_with_summary(None, store_id)
        .await
        .unwrap();
    assert_eq!(summary.average_rating, Decimal::from(5));
    assert_eq!(summary.total_ratings, 1);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_storage_rejects_out_of_range_score(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let (rater, _) = user(&pool, "rater@example.com", Role::NormalUser).await;
    let store_id = store(&pool, &admin, &owner, "Corner Bakery and Coffee House").await;

    // Bypass the typed score to reach the CHECK constraint.
    let err = sqlx::query("INSERT INTO ratings.rating (rater_id, store_id, score) VALUES ($1, $2, 6)")
        .bind(rater.id)
        .bind(store_id)
        .execute(&pool)
        .await
        .unwrap_err();

    let RepositoryError::Invalid(validation) = RepositoryError::from(err) else {
        panic!("expected a check violation");
    };
    assert_eq!(validation.field(), Field::Score);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_upserts_leave_one_rating(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let (_, rater) = user(&pool, "rater@example.com", Role::NormalUser).await;
    let store_id = store(&pool, &admin, &owner, "Corner Bakery and Coffee House").await;

    let mut tasks = JoinSet::new();
    for score in [1_i64, 2, 3, 4, 5, 3] {
        let pool = pool.clone();
        tasks.spawn(async move {
            RatingService::new(&pool)
                .upsert(&rater, store_id, Score::try_from(score).unwrap())
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().is_ok());
    }

    let ratings = RatingService::new(&pool)
        .list_for_store(None, store_id)
        .await
        .unwrap();
    assert_eq!(ratings.len(), 1);

    let summary = StoreService::new(&pool)
        .get_with_summary(None, store_id)
        .await
        .unwrap();
    assert_eq!(summary.total_ratings, 1);
}

async fn check_field(pool: &PgPool, sql: &str, id: i64) -> Field {
    let err = sqlx::query(sql).bind(id).execute(pool).await.unwrap_err();
    let RepositoryError::Invalid(validation) = RepositoryError::from(err) else {
        panic!("expected a check violation for {sql}");
    };
    validation.field()
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_storage_enforces_profile_name_length(pool: PgPool) {
    let (profile, _) = user(&pool, "someone@example.com", Role::NormalUser).await;
    let id = profile.id.as_i64();

    let short = format!("UPDATE ratings.profile SET name = '{}' WHERE id = $1", "n".repeat(19));
    assert_eq!(check_field(&pool, &short, id).await, Field::Name);

    let long = format!("UPDATE ratings.profile SET name = '{}' WHERE id = $1", "n".repeat(61));
    assert_eq!(check_field(&pool, &long, id).await, Field::Name);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_storage_rejects_empty_store_address(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let store_id = store(&pool, &admin, &owner, "Corner Bakery and Coffee House").await;

    let field = check_field(
        &pool,
        "UPDATE ratings.store SET address = '' WHERE id = $1",
        store_id.as_i64(),
    )
    .await;
    assert_eq!(field, Field::Address);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_storage_accepts_empty_profile_address(pool: PgPool) {
    let (profile, _) = user(&pool, "someone@example.com", Role::NormalUser).await;

    let result = sqlx::query("UPDATE ratings.profile SET address = '' WHERE id = $1")
        .bind(profile.id.as_i64())
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);

    let too_long = format!(
        "UPDATE ratings.profile SET address = '{}' WHERE id = $1",
        "a".repeat(401)
    );
    assert_eq!(check_field(&pool, &too_long, profile.id.as_i64()).await, Field::Address);
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_rater_contact_shown_to_rater_owner_and_admin(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner_profile, owner) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let (rater_profile, rater) = user(&pool, "rater@example.com", Role::NormalUser).await;
    let store_id = store(&pool, &admin, &owner_profile, "Corner Bakery and Coffee House").await;
    rate(&pool, &rater, store_id, 2).await;

    let service = RatingService::new(&pool);
    for caller in [&rater, &owner, &admin] {
        let ratings = service.list_for_store(Some(caller), store_id).await.unwrap();
        let entry = ratings.first().unwrap();
        assert_eq!(entry.rater_name.as_ref(), Some(&rater_profile.name));
        assert_eq!(
            entry.rater_email.as_ref().map(Email::as_str),
            Some("rater@example.com")
        );
    }
}

#[sqlx::test(migrations = "../server/migrations")]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_rater_contact_hidden_from_anonymous_and_strangers(pool: PgPool) {
    let (_, admin) = user(&pool, "admin@example.com", Role::Admin).await;
    let (owner_profile, _) = user(&pool, "owner@example.com", Role::StoreOwner).await;
    let (_, rater) = user(&pool, "rater@example.com", Role::NormalUser).await;
    let (_, stranger) = user(&pool, "stranger@example.com", Role::NormalUser).await;
    let (other_owner_profile, other_owner) =
        user(&pool, "other-owner@example.com", Role::StoreOwner).await;
    let store_id = store(&pool, &admin, &owner_profile, "Corner Bakery and Coffee House").await;
    store(&pool, &admin, &other_owner_profile, "Riverside Books and Maps").await;
    rate(&pool, &rater, store_id, 2).await;

    let service = RatingService::new(&pool);
    for caller in [None, Some(&stranger), Some(&other_owner)] {
        let ratings = service.list_for_store(caller, store_id).await.unwrap();
        let entry = ratings.first().unwrap();
        assert_eq!(entry.rating.score.get(), 2);
        assert!(entry.rater_name.is_none());
        assert!(entry.rater_email.is_none());
    }
}
