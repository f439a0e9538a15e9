//! PostgreSQL round trips. Skipped unless `DATABASE_URL` is set.

#![cfg(all(feature = "postgres", feature = "derive"))]

use rowmap::{Db, Dialect, FromValue, Record, named};

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[rowmap(table = "rowmap_pg_company")]
struct Company {
    #[rowmap(auto_key)]
    id: i32,
    name: String,
    ticker: String,
}

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[rowmap(table = "rowmap_pg_tiny")]
struct Tiny {
    #[rowmap(auto_key)]
    id: i8,
    label: String,
}

async fn try_connect() -> Option<Db<tokio_postgres::Client>> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let (client, connection) = tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("tokio-postgres connection error: {e}");
        }
    });
    Some(Db::new(client).with_dialect(Dialect::Postgres))
}

#[tokio::test]
async fn crud_with_returning() {
    let Some(mut db) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let tx = db.begin().await.unwrap();
    tx.execute_named("DROP TABLE IF EXISTS rowmap_pg_company", &[])
        .await
        .unwrap();
    tx.create_table(&Company::default()).await.unwrap();

    let mut ibm = Company {
        id: 0,
        name: "IBM".into(),
        ticker: "IBM".into(),
    };
    let key = tx.insert(&ibm).await.unwrap().unwrap();
    ibm.id = i32::from_value(key.value).unwrap();
    assert!(ibm.id > 0);

    let mut loaded = Company {
        id: ibm.id,
        ..Default::default()
    };
    tx.get(&mut loaded).await.unwrap();
    assert_eq!(loaded, ibm);

    let found: Vec<Company> = tx
        .select("WHERE ticker = @ticker AND id = @id", &[named("ticker", "IBM"), named("id", ibm.id)])
        .await
        .unwrap();
    assert_eq!(found, [ibm.clone()]);

    ibm.name = "International Business Machines".into();
    tx.update(&ibm).await.unwrap();
    assert_eq!(tx.delete(&ibm).await.unwrap(), 1);
    assert!(tx.get(&mut loaded).await.unwrap_err().is_not_found());

    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn returned_key_overflow() {
    let Some(mut db) = try_connect().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let tx = db.begin().await.unwrap();
    tx.execute_named("DROP TABLE IF EXISTS rowmap_pg_tiny", &[])
        .await
        .unwrap();
    tx.create_table(&Tiny::default()).await.unwrap();
    let rows = tx
        .query_named(
            "SELECT setval(pg_get_serial_sequence('rowmap_pg_tiny', 'id'), @start)",
            &[named("start", 300_i64)],
        )
        .await
        .unwrap();
    assert_eq!(rows[0].get::<i64>(0).unwrap(), 300);

    let tiny = Tiny {
        id: 0,
        label: "x".into(),
    };
    let err = tx.insert(&tiny).await.unwrap_err();
    assert!(err.is_key_overflow(), "unexpected error: {err}");
    tx.rollback().await.unwrap();
}
