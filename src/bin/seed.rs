use grocery_drive_api::{
    config::AppConfig,
    db::{DbPool, create_pool},
    models::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin1234", "Ada", "Admin", Role::Admin).await?;
    let client_id = ensure_user(&pool, "client@example.com", "client1234", "Camille", "Client", Role::Client).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Client ID: {client_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, first_name, last_name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn ensure_category(pool: &DbPool, name: &str, parent: Option<Uuid>) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM categories WHERE name = $1 AND parent_id IS NOT DISTINCT FROM $2",
    )
    .bind(name)
    .bind(parent)
    .fetch_optional(pool)
    .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO categories (id, name, parent_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(parent)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_catalog(pool: &DbPool) -> anyhow::Result<()> {
    let fresh = ensure_category(pool, "Fresh produce", None).await?;
    let fruit = ensure_category(pool, "Fruit", Some(fresh)).await?;
    let citrus = ensure_category(pool, "Citrus", Some(fruit)).await?;
    let vegetables = ensure_category(pool, "Vegetables", Some(fresh)).await?;
    let pantry = ensure_category(pool, "Pantry", None).await?;
    let dairy = ensure_category(pool, "Dairy", None).await?;

    // (name, description, unit, price in cents, pack quantity, category)
    let products = [
        ("Gala apples", "Crisp apples from Normandy", "kg", 289, 1, fruit),
        ("Organic lemons", "Unwaxed, net of 4", "pack", 65, 4, citrus),
        ("Oranges", "Juice oranges, 2 kg bag", "kg", 199, 2, citrus),
        ("Carrots", "Loose carrots", "kg", 149, 1, vegetables),
        ("Baby spinach", "Washed, ready to eat", "g", 1, 250, vegetables),
        ("Basmati rice", "Long grain rice", "kg", 349, 1, pantry),
        ("Olive oil", "Extra virgin, 75 cl bottle", "cl", 12, 75, pantry),
        ("Semi-skimmed milk", "Pack of 6 bottles", "pack", 105, 6, dairy),
        ("Plain yoghurts", "Pack of 8", "piece", 35, 8, dairy),
    ];

    for (name, description, unit, price, stock, category) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, unit, price, stock, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(unit)
        .bind(price as i64)
        .bind(stock as i32)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories and products");
    Ok(())
}
