//! # Seed Data Generator
//!
//! Populates the database with a small rental store for development.
//!
//! ## Usage
//! ```bash
//! # 200 films (default) into $SAKILA_DB_PATH or ./sakila.db
//! cargo run -p sakila-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p sakila-db --bin seed -- --films 1000 --db ./data/sakila.db
//! ```
//!
//! ## Generated Data
//! - 16 categories (Action, Animation, ... Travel)
//! - 8 actors
//! - Films titled `{ADJECTIVE} {NOUN}` with rates 0.99 / 2.99 / 4.99,
//!   1 to 4 copies each
//! - 2 staff members (one admin)
//! - 20 customers

use sakila_core::{FilmRating, NewActor, NewCustomer, NewFilm, NewStaff};
use sakila_db::{Database, StoreConfig};
use std::env;
use tracing::warn;

const CATEGORIES: &[&str] = &[
    "Action",
    "Animation",
    "Children",
    "Classics",
    "Comedy",
    "Documentary",
    "Drama",
    "Family",
    "Foreign",
    "Games",
    "Horror",
    "Music",
    "New",
    "Sci-Fi",
    "Sports",
    "Travel",
];

const ADJECTIVES: &[&str] = &[
    "ACADEMY", "ACE", "ADAPTATION", "AFFAIR", "AFRICAN", "AGENT", "AIRPLANE", "ALABAMA",
    "ALADDIN", "ALAMO", "ALASKA", "ALI", "ALIEN", "ALLEY", "ALONE", "AMADEUS", "AMELIE",
    "AMERICAN", "AMISTAD", "ANACONDA", "ANGELS", "ANNIE", "ANTHEM", "ANTITRUST", "APACHE",
];

const NOUNS: &[&str] = &[
    "DINOSAUR", "GOLDFINGER", "HOLES", "PREJUDICE", "EGG", "TRUMAN", "SIERRA", "DEVIL",
    "CALENDAR", "CHAMPION", "CENTER", "FORREST", "HEAVEN", "HOLY", "TRIP",
];

const RATES: &[i64] = &[99, 299, 499];

const RATINGS: &[FilmRating] = &[
    FilmRating::G,
    FilmRating::Pg,
    FilmRating::Pg13,
    FilmRating::R,
    FilmRating::Nc17,
];

const ACTORS: &[(&str, &str)] = &[
    ("PENELOPE", "GUINESS"),
    ("NICK", "WAHLBERG"),
    ("ED", "CHASE"),
    ("JENNIFER", "DAVIS"),
    ("JOHNNY", "LOLLOBRIGIDA"),
    ("BETTE", "NICHOLSON"),
    ("GRACE", "MOSTEL"),
    ("MATTHEW", "JOHANSSON"),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("MARY", "SMITH"),
    ("PATRICIA", "JOHNSON"),
    ("LINDA", "WILLIAMS"),
    ("BARBARA", "JONES"),
    ("ELIZABETH", "BROWN"),
    ("JENNIFER", "DAVIS"),
    ("MARIA", "MILLER"),
    ("SUSAN", "WILSON"),
    ("MARGARET", "MOORE"),
    ("DOROTHY", "TAYLOR"),
    ("LISA", "ANDERSON"),
    ("NANCY", "THOMAS"),
    ("KAREN", "JACKSON"),
    ("BETTY", "WHITE"),
    ("HELEN", "HARRIS"),
    ("SANDRA", "MARTIN"),
    ("DONNA", "THOMPSON"),
    ("CAROL", "GARCIA"),
    ("RUTH", "MARTINEZ"),
    ("SHARON", "ROBINSON"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sakila_db::init_tracing();

    let mut config = StoreConfig::load()?;
    let mut films: usize = 200;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--films" | "-f" => {
                if i + 1 < args.len() {
                    films = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sakila Rental Desk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --films <N>    Number of films to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: $SAKILA_DB_PATH or ./sakila.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let films = films.min(ADJECTIVES.len() * NOUNS.len());

    println!("Sakila Rental Desk Seed Data Generator");
    println!("======================================");
    println!("Database: {}", config.database_path.display());
    println!("Films:    {}", films);
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.films().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} films", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for name in CATEGORIES {
        db.categories().get_or_create(name).await?;
    }
    println!("✓ {} categories", CATEGORIES.len());

    for (first, last) in ACTORS {
        db.actors()
            .insert(&NewActor {
                first_name: first.to_string(),
                last_name: last.to_string(),
            })
            .await?;
    }
    println!("✓ {} actors", ACTORS.len());

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut copies = 0;

    for seed in 0..films {
        let film = generate_film(seed);
        let title = film.title.clone();

        let inserted = match db.films().insert(&film).await {
            Ok(inserted) => inserted,
            Err(err) => {
                warn!(title = %title, error = %err, "Failed to insert film");
                continue;
            }
        };

        let count = 1 + (seed % 4) as i64;
        db.inventory().add_copies(inserted.film_id, count).await?;

        generated += 1;
        copies += count;

        if generated % 50 == 0 {
            println!("  Generated {} films...", generated);
        }
    }

    println!(
        "✓ Generated {} films with {} copies in {:?}",
        generated,
        copies,
        start.elapsed()
    );

    db.staff()
        .insert(&NewStaff {
            first_name: "Mike".to_string(),
            last_name: "Hillyer".to_string(),
            email: "Mike.Hillyer@sakilastaff.com".to_string(),
            is_admin: true,
        })
        .await?;
    db.staff()
        .insert(&NewStaff {
            first_name: "Jon".to_string(),
            last_name: "Stephens".to_string(),
            email: "Jon.Stephens@sakilastaff.com".to_string(),
            is_admin: false,
        })
        .await?;
    println!("✓ 2 staff members");

    for (idx, (first, last)) in CUSTOMERS.iter().enumerate() {
        db.customers()
            .insert(&NewCustomer {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: format!("{first}.{last}@sakilacustomer.org"),
                address: format!("{} Sakila Way", 100 + idx * 7),
                district: Some("Alberta".to_string()),
                postal_code: Some(format!("{:05}", 35200 + idx)),
                city: Some("Lethbridge".to_string()),
                country: Some("Canada".to_string()),
            })
            .await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    if generated > 0 {
        println!();
        let sample = db.availability().list_available_for_film(1, 1, 10).await?;
        println!("  Film 1: {} copies available", sample.total_count);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one film; `seed` picks title, rate, duration and category.
fn generate_film(seed: usize) -> NewFilm {
    let adjective = ADJECTIVES[seed % ADJECTIVES.len()];
    let noun = NOUNS[(seed / ADJECTIVES.len()) % NOUNS.len()];

    NewFilm {
        title: format!("{adjective} {noun}"),
        description: Some(format!(
            "A {} {} in a {} far away",
            ["Epic", "Astounding", "Touching", "Thoughtful"][seed % 4],
            ["Drama", "Saga", "Story", "Documentary"][(seed / 4) % 4],
            ["Gulf", "Canyon", "Jet Boat", "Abandoned Mine"][(seed / 16) % 4],
        )),
        release_year: Some(2006),
        rental_rate_cents: RATES[seed % RATES.len()],
        rental_duration: Some(3 + (seed % 5) as i64),
        length: Some(46 + ((seed * 37) % 140) as i64),
        rating: Some(RATINGS[seed % RATINGS.len()]),
        category: Some(CATEGORIES[seed % CATEGORIES.len()].to_string()),
    }
}
