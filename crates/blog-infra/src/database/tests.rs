use std::collections::BTreeMap;

use chrono::{TimeDelta, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use blog_core::domain::{Category, Comment, FeedScope, ListFilter};
use blog_core::error::RepoError;
use blog_core::pagination::{PageNumber, PageRequest};
use blog_core::ports::{BaseRepository, CategoryRepository, CommentRepository, PostRepository};

use crate::database::entity::{category, comment, location, post, user};
use crate::database::postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
};

fn category_model(slug: &str, is_published: bool) -> category::Model {
    category::Model {
        id: Uuid::new_v4(),
        title: "Travel".to_owned(),
        description: "Trips and places".to_owned(),
        slug: slug.to_owned(),
        is_published,
        created_at: Utc::now().into(),
    }
}

fn user_model(username: &str) -> user::Model {
    user::Model {
        id: Uuid::new_v4(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        first_name: String::new(),
        last_name: String::new(),
        password_hash: "hash".to_owned(),
        is_staff: false,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn post_model(author: &user::Model, category: &category::Model, title: &str) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        author_id: author.id,
        title: title.to_owned(),
        text: "Body".to_owned(),
        pub_date: (Utc::now() - TimeDelta::hours(1)).into(),
        image: None,
        is_published: true,
        location_id: None,
        category_id: Some(category.id),
        created_at: Utc::now().into(),
    }
}

fn count_row(num_items: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::from(num_items))])
}

fn comment_count_row(post_id: Uuid, comment_count: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("post_id", Value::from(post_id)),
        ("comment_count", Value::from(comment_count)),
    ])
}

fn logged_sql(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .flat_map(|t| t.statements())
        .map(|s| s.sql.clone())
        .collect()
}

#[tokio::test]
async fn test_find_category_by_slug() {
    let model = category_model("travel", false);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![model.clone()]])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);

    let found: Category = repo.find_by_slug("travel").await.unwrap().unwrap();

    assert_eq!(found.id, model.id);
    assert_eq!(found.slug, "travel");
    assert!(!found.is_published);
}

#[tokio::test]
async fn test_find_category_by_id_missing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<category::Model>::new()])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);

    let found = BaseRepository::<Category, Uuid>::find_by_id(&repo, Uuid::new_v4())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_delete_missing_category_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db);

    let result = BaseRepository::<Category, Uuid>::delete(&repo, Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_comments_come_with_authors() {
    let post_id = Uuid::new_v4();
    let author = user_model("reader");
    let first = comment::Model {
        id: Uuid::new_v4(),
        post_id,
        author_id: author.id,
        text: "First!".to_owned(),
        created_at: Utc::now().into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![(first.clone(), author.clone())]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    let entries = repo.find_by_post(post_id).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].comment, Comment::from(first));
    assert_eq!(entries[0].author.username, "reader");
}

#[tokio::test]
async fn test_public_feed_query_and_comment_counts() {
    let author = user_model("writer");
    let travel = category_model("travel", true);
    let newer = post_model(&author, &travel, "Newer");
    let older = post_model(&author, &travel, "Older");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(2)]])
        .append_query_results(vec![vec![newer.clone(), older.clone()]])
        .append_query_results(vec![vec![author.clone()]])
        .append_query_results(vec![vec![travel.clone()]])
        .append_query_results(vec![Vec::<location::Model>::new()])
        .append_query_results(vec![vec![comment_count_row(newer.id, 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());

    let page = repo
        .feed(FeedScope::Public, Utc::now(), PageRequest::new(PageNumber::First))
        .await
        .unwrap();

    assert_eq!(page.total_items, 2);
    assert_eq!(page.number, 1);
    let titles: Vec<&str> = page.items.iter().map(|e| e.post.title.as_str()).collect();
    assert_eq!(titles, ["Newer", "Older"]);
    assert_eq!(page.items[0].comment_count, 3);
    assert_eq!(page.items[1].comment_count, 0);
    assert_eq!(page.items[0].author.username, "writer");
    assert_eq!(page.items[0].category.as_ref().map(|c| c.id), Some(travel.id));

    drop(repo);
    let sql = logged_sql(db);
    let feed = &sql[1];
    assert!(feed.contains(r#"LEFT JOIN "categories""#), "{feed}");
    assert!(feed.contains(r#""posts"."is_published" = $"#), "{feed}");
    assert!(feed.contains(r#""posts"."pub_date" <= $"#), "{feed}");
    assert!(feed.contains(r#""categories"."is_published" = $"#), "{feed}");
    assert!(
        feed.contains(r#"ORDER BY "posts"."pub_date" DESC, "posts"."created_at" DESC"#),
        "{feed}"
    );
    assert!(sql[5].contains("GROUP BY"), "{}", sql[5]);
}

#[tokio::test]
async fn test_feed_page_past_the_end_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(0)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = repo
        .feed(FeedScope::Public, Utc::now(), PageRequest::new(PageNumber::Number(2)))
        .await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_empty_feed_still_has_a_first_page() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(0)]])
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let page = repo
        .feed(FeedScope::Public, Utc::now(), PageRequest::new(PageNumber::First))
        .await
        .unwrap();
    assert_eq!(page.number, 1);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_own_profile_feed_skips_visibility_filter() {
    let author = user_model("writer");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![count_row(0)]])
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());

    let scope = FeedScope::Author {
        author_id: author.id,
        include_hidden: true,
    };
    repo.feed(scope, Utc::now(), PageRequest::new(PageNumber::First))
        .await
        .unwrap();

    drop(repo);
    let sql = logged_sql(db);
    assert!(sql[1].contains(r#""posts"."author_id" = $"#), "{}", sql[1]);
    assert!(!sql[1].contains(r#""categories"."is_published""#), "{}", sql[1]);
}

#[tokio::test]
async fn test_find_visible_lets_author_through() {
    let author = user_model("writer");
    let travel = category_model("travel", false);
    let hidden = post::Model {
        is_published: false,
        ..post_model(&author, &travel, "Draft")
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![hidden.clone()]])
        .append_query_results(vec![vec![author.clone()]])
        .append_query_results(vec![vec![travel.clone()]])
        .append_query_results(vec![Vec::<location::Model>::new()])
        .append_query_results(vec![Vec::<BTreeMap<&'static str, Value>>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());

    let entry = repo
        .find_visible(hidden.id, Some(author.id), Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.post.id, hidden.id);
    assert_eq!(entry.comment_count, 0);

    drop(repo);
    let sql = logged_sql(db);
    let lookup = &sql[0];
    assert!(lookup.contains(r#""posts"."author_id" = $"#), "{lookup}");
    assert!(lookup.contains(" OR "), "{lookup}");
    assert!(lookup.contains(r#""categories"."is_published" = $"#), "{lookup}");
}

#[tokio::test]
async fn test_find_visible_anonymous_uses_public_condition_only() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());

    let found = repo
        .find_visible(Uuid::new_v4(), None, Utc::now())
        .await
        .unwrap();
    assert!(found.is_none());

    drop(repo);
    let sql = logged_sql(db);
    assert_eq!(sql.len(), 1);
    assert!(!sql[0].contains(r#""posts"."author_id""#), "{}", sql[0]);
    assert!(sql[0].contains(r#""posts"."pub_date" <= $"#), "{}", sql[0]);
}

#[tokio::test]
async fn test_category_search_treats_wildcards_literally() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<category::Model>::new()])
        .into_connection();

    let repo = PostgresCategoryRepository::new(db.clone());

    let filter = ListFilter {
        search: Some("50%_off".to_owned()),
        is_published: None,
    };
    let found = repo.list(&filter).await.unwrap();
    assert!(found.is_empty());

    drop(repo);
    let log = db.into_transaction_log();
    let statement = &log[0].statements()[0];
    assert!(statement.sql.contains("ESCAPE"), "{}", statement.sql);
    let values = format!("{:?}", statement.values);
    assert!(values.contains(r"%50\\%\\_off%"), "{values}");
}
