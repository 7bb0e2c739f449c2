use chrono::NaiveDate;
use sqlx::PgPool;

use crate::demo_data;
use crate::error::ServiceError;
use crate::import;
use crate::models::{
    grand_totals, BoxCounts, Company, Image, Language, NewEntry, StatsFilter, StatsGrouping,
};

use super::{AppState, DatabaseConnection};

async fn connect(pool: PgPool) -> DatabaseConnection {
    let app_state = AppState::from_pool(pool).await.unwrap();
    app_state.connection().await.unwrap()
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn company(name: &str) -> Company {
    Company {
        id: 0,
        name: name.to_owned(),
        address: None,
        phone: None,
        email: None,
        balance: None,
    }
}

fn new_entry(day: &str, company_id: i32, counts: [i64; 4], starting: bool) -> NewEntry {
    NewEntry {
        entry_date: date(day),
        company_id,
        counts: BoxCounts {
            e2_in: counts[0],
            e1_in: counts[1],
            e2_out: counts[2],
            e1_out: counts[3],
        },
        photo_url: None,
        is_starting_balance: starting,
    }
}

#[sqlx::test]
async fn test_company_crud(pool: PgPool) {
    let mut db = connect(pool).await;

    let publimar = db.store_company(company("publimar")).await.unwrap();
    assert!(publimar.id > 0);
    assert_eq!(
        db.get_company_by_id(publimar.id).await.unwrap(),
        Some(publimar.clone())
    );
    assert_eq!(
        db.get_company_by_name("publimar").await.unwrap(),
        Some(publimar.clone())
    );

    let duplicate = db.store_company(company("publimar")).await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));

    let mut updated = publimar.clone();
    updated.phone = Some("+48 123 456 789".to_owned());
    let updated = db.store_company(updated).await.unwrap();
    assert_eq!(updated.id, publimar.id);
    assert_eq!(updated.phone.as_deref(), Some("+48 123 456 789"));

    db.ensure_company("publimar").await.unwrap();
    db.ensure_company("duda").await.unwrap();
    let names: Vec<String> = db
        .get_all_companies()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["duda", "publimar"]);

    db.delete_company(publimar.id).await.unwrap();
    assert_eq!(db.get_company_by_id(publimar.id).await.unwrap(), None);
}

#[sqlx::test]
async fn test_entry_crud(pool: PgPool) {
    let mut db = connect(pool).await;
    let publimar = db.store_company(company("publimar")).await.unwrap();

    let entry = db
        .create_entry(new_entry("2025-01-01", publimar.id, [114, 0, 160, 0], false))
        .await
        .unwrap();
    assert_eq!(entry.company, "publimar");
    assert_eq!(entry.counts.balance_e2(), 46);
    assert_eq!(db.get_entry_by_id(entry.id).await.unwrap(), Some(entry.clone()));
    assert_eq!(db.count_entries_for_company(publimar.id).await.unwrap(), 1);

    let updated = db
        .update_entry(
            entry.id,
            new_entry("2025-01-02", publimar.id, [119, 0, 120, 0], false),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.entry_date, date("2025-01-02"));
    assert_eq!(updated.counts.e2_in, 119);

    let missing = db
        .update_entry(entry.id + 100, new_entry("2025-01-02", publimar.id, [0; 4], false))
        .await
        .unwrap();
    assert_eq!(missing, None);

    db.delete_entry(entry.id + 100).await.unwrap();
    assert_eq!(db.get_entries(100, 0).await.unwrap().len(), 1);

    db.delete_entry(entry.id).await.unwrap();
    assert_eq!(db.get_entry_by_id(entry.id).await.unwrap(), None);
}

#[sqlx::test]
async fn test_bulk_delete_and_date_range(pool: PgPool) {
    let mut db = connect(pool).await;
    let duda = db.store_company(company("duda")).await.unwrap();

    assert_eq!(db.get_entry_date_range().await.unwrap(), (None, None));

    let mut ids = Vec::new();
    for day in ["2025-01-01", "2025-01-05", "2025-02-10"] {
        let entry = db
            .create_entry(new_entry(day, duda.id, [0, 10, 0, 5], false))
            .await
            .unwrap();
        ids.push(entry.id);
    }

    assert_eq!(
        db.get_entry_date_range().await.unwrap(),
        (Some(date("2025-01-01")), Some(date("2025-02-10")))
    );

    assert_eq!(db.delete_entries(&[]).await.unwrap(), 0);
    assert_eq!(db.delete_entries(&[ids[0], ids[1], -1]).await.unwrap(), 2);

    let remaining = db.get_entries(100, 0).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ids[2]);
}

#[sqlx::test]
async fn test_entries_in_range(pool: PgPool) {
    let mut db = connect(pool).await;
    let publimar = db.store_company(company("publimar")).await.unwrap();
    let duda = db.store_company(company("duda")).await.unwrap();

    db.create_entry(new_entry("2025-01-01", publimar.id, [1, 0, 0, 0], false))
        .await
        .unwrap();
    db.create_entry(new_entry("2025-01-15", duda.id, [0, 1, 0, 0], false))
        .await
        .unwrap();
    db.create_entry(new_entry("2025-01-31", publimar.id, [0, 0, 1, 0], false))
        .await
        .unwrap();
    db.create_entry(new_entry("2025-02-01", publimar.id, [0, 0, 0, 1], false))
        .await
        .unwrap();

    let all = db
        .get_entries_in_range(date("2025-01-01"), date("2025-01-31"), &[])
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = all.iter().map(|e| e.entry_date).collect();
    assert_eq!(
        dates,
        vec![date("2025-01-31"), date("2025-01-15"), date("2025-01-01")]
    );

    let filtered = db
        .get_entries_in_range(
            date("2025-01-01"),
            date("2025-01-31"),
            &["duda".to_owned()],
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].company, "duda");
}

#[sqlx::test]
async fn test_grand_totals_match_across_groupings(pool: PgPool) {
    let mut db = connect(pool).await;
    demo_data::load_demo_data(&mut db).await.unwrap();

    for include_starting_balances in [true, false] {
        let filter = StatsFilter::new(include_starting_balances);
        let by_company = db.get_stats(StatsGrouping::Company, filter).await.unwrap();
        let by_month = db.get_stats(StatsGrouping::Month, filter).await.unwrap();
        let by_quarter = db.get_stats(StatsGrouping::Quarter, filter).await.unwrap();

        assert_eq!(grand_totals(&by_company), grand_totals(&by_month));
        assert_eq!(grand_totals(&by_company), grand_totals(&by_quarter));
    }

    let filter = StatsFilter {
        include_starting_balances: true,
        start_date: Some(date("2025-01-01")),
        end_date: Some(date("2025-01-02")),
    };
    let by_company = db.get_stats(StatsGrouping::Company, filter).await.unwrap();
    let by_month = db.get_stats(StatsGrouping::Month, filter).await.unwrap();
    assert_eq!(grand_totals(&by_company), grand_totals(&by_month));
}

#[sqlx::test]
async fn test_settings(pool: PgPool) {
    let mut db = connect(pool).await;

    assert_eq!(db.get_language().await.unwrap(), Language::En);
    assert!(db.get_include_starting_balances().await.unwrap());

    db.set_language(Language::Pl).await.unwrap();
    db.set_language(Language::Pl).await.unwrap();
    assert_eq!(db.get_language().await.unwrap(), Language::Pl);

    db.set_include_starting_balances(false).await.unwrap();
    assert!(!db.get_include_starting_balances().await.unwrap());
    assert_eq!(
        db.get_setting("includeStartingBalances").await.unwrap(),
        Some("false".to_owned())
    );
}

#[sqlx::test]
async fn test_csv_import_skips_unknown_companies(pool: PgPool) {
    let mut db = connect(pool).await;
    db.store_company(company("publimar")).await.unwrap();

    let text = "data,firma,pojemniki przyjęte E2,pojemniki przyjęte E1,pojemniki oddane E2,pojemniki oddane E1\n\
                01/01/2025,Publimar,114,0,160,0\n\
                01/01/2025,Unknown Co,5,5,5,5\n";

    let companies = db.get_all_companies().await.unwrap();
    let result = import::import_csv(&mut db, text, &companies).await.unwrap();
    assert_eq!(result.count, 1);
    assert_eq!(result.error, None);

    let entries = db.get_entries(100, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].company, "publimar");
    assert_eq!(db.get_all_companies().await.unwrap().len(), 1);
}

#[sqlx::test]
async fn test_seed_is_idempotent(pool: PgPool) {
    let mut db = connect(pool).await;

    let inserted = demo_data::load_demo_data(&mut db).await.unwrap();
    assert_eq!(inserted, 10);
    assert_eq!(db.get_all_companies().await.unwrap().len(), 4);
    assert_eq!(db.get_starting_balances().await.unwrap().len(), 5);

    let inserted = demo_data::load_demo_data(&mut db).await.unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(db.get_entries(100, 0).await.unwrap().len(), 10);
}

#[sqlx::test]
async fn test_photo_storage(pool: PgPool) {
    let mut db = connect(pool).await;

    let image = Image {
        data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        mimetype: "image/png".to_owned(),
    };
    let id = db.store_photo(image.clone()).await.unwrap();

    assert_eq!(db.get_photo(id).await.unwrap(), Some(image));
    assert_eq!(db.get_photo(id + 1).await.unwrap(), None);
}

#[sqlx::test]
async fn test_users(pool: PgPool) {
    let mut db = connect(pool).await;

    let user = db
        .create_user("admin@example.org", "Admin", "hash", true)
        .await
        .unwrap();
    assert!(user.is_admin);
    assert_eq!(
        db.get_user_by_email("admin@example.org").await.unwrap(),
        Some(user.clone())
    );
    assert_eq!(db.get_user_by_id(user.id).await.unwrap(), Some(user));

    let duplicate = db
        .create_user("admin@example.org", "Other", "hash", false)
        .await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
}
