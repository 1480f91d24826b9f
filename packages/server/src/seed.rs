use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder, SqliteQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{duel, duel_participant, question};

struct SampleQuestion {
    slug: &'static str,
    title: &'static str,
    difficulty: &'static str,
    tags: &'static [&'static str],
    description: &'static str,
}

const SAMPLE_QUESTIONS: &[SampleQuestion] = &[
    SampleQuestion {
        slug: "two-sum",
        title: "Two Sum",
        difficulty: "Easy",
        tags: &["Array", "Hash Table"],
        description: "### Problem\n\nGiven an array of integers `nums` and an integer `target`, \
return indices of the two numbers such that they add up to `target`.\n\n\
You may assume that each input would have exactly one solution, and you may not use the same \
element twice.\n\n### Example\n```txt\nInput: nums = [2,7,11,15], target = 9\nOutput: [0,1]\n```",
    },
    SampleQuestion {
        slug: "add-two-numbers",
        title: "Add Two Numbers",
        difficulty: "Medium",
        tags: &["Linked List", "Math"],
        description: "### Problem\n\nYou are given two non-empty linked lists representing two \
non-negative integers. The digits are stored in reverse order, and each of their nodes contains \
a single digit. Add the two numbers and return the sum as a linked list.",
    },
    SampleQuestion {
        slug: "longest-substring-without-repeating-characters",
        title: "Longest Substring Without Repeating Characters",
        difficulty: "Medium",
        tags: &["Hash Table", "String", "Sliding Window"],
        description: "### Problem\n\nGiven a string `s`, find the length of the longest \
substring without repeating characters.",
    },
    SampleQuestion {
        slug: "median-of-two-sorted-arrays",
        title: "Median of Two Sorted Arrays",
        difficulty: "Hard",
        tags: &["Array", "Binary Search", "Divide and Conquer"],
        description: "### Problem\n\nGiven two sorted arrays `nums1` and `nums2` of size m and n \
respectively, return the median of the two sorted arrays.",
    },
    SampleQuestion {
        slug: "longest-palindromic-substring",
        title: "Longest Palindromic Substring",
        difficulty: "Medium",
        tags: &["String", "Dynamic Programming"],
        description: "### Problem\n\nGiven a string `s`, return the longest palindromic \
substring in `s`.",
    },
    SampleQuestion {
        slug: "palindrome-number",
        title: "Palindrome Number",
        difficulty: "Easy",
        tags: &["Math"],
        description: "### Problem\n\nGiven an integer `x`, return true if `x` is a palindrome, \
and false otherwise.",
    },
];

/// Insert the sample questions that are not present yet (matched by slug).
pub async fn seed_questions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for sample in SAMPLE_QUESTIONS {
        let model = question::ActiveModel {
            slug: Set(sample.slug.to_string()),
            title: Set(sample.title.to_string()),
            difficulty: Set(sample.difficulty.to_string()),
            tags: Set(serde_json::json!(sample.tags)),
            description: Set(sample.description.to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let result = question::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(question::Column::Slug)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(0) => {}
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} sample questions", inserted);
    }
    Ok(())
}

/// Ensure indexes that schema-sync cannot express.
///
/// The unique `(duel_id, slot)` index is what stops two joiners from both
/// taking the last slot, so failing to create it is an error.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let slot_index = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_duel_participant_slot")
        .table(duel_participant::Entity)
        .col(duel_participant::Column::DuelId)
        .col(duel_participant::Column::Slot)
        .to_owned();
    db.execute_unprepared(&render(db, &slot_index)).await?;
    info!("Ensured index idx_duel_participant_slot exists");

    // Public listing: WHERE is_public AND status IN (...) ORDER BY created_at DESC
    let listing_index = Index::create()
        .if_not_exists()
        .name("idx_duel_public_status_created")
        .table(duel::Entity)
        .col(duel::Column::IsPublic)
        .col(duel::Column::Status)
        .col(duel::Column::CreatedAt)
        .to_owned();
    match db.execute_unprepared(&render(db, &listing_index)).await {
        Ok(_) => info!("Ensured index idx_duel_public_status_created exists"),
        Err(e) => warn!(
            "Failed to create index idx_duel_public_status_created: {}",
            e
        ),
    }

    // Participant lookups by user: WHERE user_id = ?
    let user_index = Index::create()
        .if_not_exists()
        .name("idx_duel_participant_user")
        .table(duel_participant::Entity)
        .col(duel_participant::Column::UserId)
        .to_owned();
    match db.execute_unprepared(&render(db, &user_index)).await {
        Ok(_) => info!("Ensured index idx_duel_participant_user exists"),
        Err(e) => warn!("Failed to create index idx_duel_participant_user: {}", e),
    }

    Ok(())
}

fn render(db: &DatabaseConnection, stmt: &IndexCreateStatement) -> String {
    match db.get_database_backend() {
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(PostgresQueryBuilder),
    }
}
