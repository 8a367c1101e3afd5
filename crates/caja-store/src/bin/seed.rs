//! # Seed Data Generator
//!
//! Populates a Caja database with demo data for development: a bodega
//! catalog, a handful of customers, one pending purchase, and two weeks of
//! sale history so the report screens show something on first launch.
//!
//! ## Usage
//! ```bash
//! # Default: 250 products into ./caja_dev.db for branch-1
//! cargo run -p caja-store --bin seed
//!
//! # Custom amount and database path
//! cargo run -p caja-store --bin seed -- --count 500 --db ./data/caja.db
//!
//! # Another branch
//! cargo run -p caja-store --bin seed -- --branch branch-2
//! ```

use chrono::{Duration, Utc};
use std::env;

use caja_core::{build_sale, Cart, Customer, NewProduct, PaymentMethod, Product, PurchaseDraft, Session};
use caja_store::{Store, StoreConfig};

/// Product categories with typical bodega items.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "ABA",
        &[
            "Arroz Extra 1kg",
            "Azúcar Rubia 1kg",
            "Aceite Vegetal 1L",
            "Fideos Spaghetti 500g",
            "Café Molido 250g",
            "Leche Evaporada 400g",
            "Atún en Lata 170g",
            "Harina Preparada 1kg",
            "Sal de Mesa 1kg",
            "Avena Instantánea 500g",
            "Lentejas 500g",
            "Frejol Canario 500g",
        ],
    ),
    (
        "BEB",
        &[
            "Agua Mineral 625ml",
            "Gaseosa Cola 500ml",
            "Gaseosa Cola 1.5L",
            "Jugo de Naranja 1L",
            "Cerveza Rubia 620ml",
            "Energizante 473ml",
            "Té Helado 500ml",
            "Agua con Gas 625ml",
        ],
    ),
    (
        "LIM",
        &[
            "Detergente en Polvo 520g",
            "Lejía Tradicional 1L",
            "Jabón de Tocador 90g",
            "Papel Higiénico x4",
            "Lavavajilla en Crema 360g",
            "Suavizante Floral 1L",
        ],
    ),
    (
        "SNK",
        &[
            "Papas Fritas 45g",
            "Galletas de Soda 6pack",
            "Galletas de Chocolate 6pack",
            "Chocolate con Leche 30g",
            "Caramelos Surtidos 100g",
            "Maní Salado 100g",
        ],
    ),
];

const BRANDS: &[&str] = &[
    "Costeño", "Primor", "Gloria", "San Luis", "Sapolio", "Field", "Pilsen", "Bolívar",
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("María Gómez", "40123456"),
    ("Juan Pérez", "70998877"),
    ("Rosa Quispe", "42556611"),
    ("Carlos Huamán", "46789012"),
    ("Lucía Torres", "41230987"),
    ("Pedro Salas", "44321765"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 250;
    let mut db_path = String::from("./caja_dev.db");
    let mut branch_id = String::from("branch-1");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(250);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--branch" | "-b" => {
                if i + 1 < args.len() {
                    branch_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caja Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of products to generate (default: 250)");
                println!("  -d, --db <PATH>      Database file path (default: ./caja_dev.db)");
                println!("  -b, --branch <ID>    Branch to seed (default: branch-1)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Caja Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Branch:   {}", branch_id);
    println!("Products: {}", count);
    println!();

    let store = Store::new(StoreConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = store.products().count(&branch_id).await?;
    if existing > 0 {
        println!("⚠ Branch already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // ===== Products =====
    println!();
    println!("Generating products...");

    let mut products: Vec<Product> = Vec::new();
    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for round in 0.. {
        for (category_idx, (code, names)) in CATEGORIES.iter().enumerate() {
            for (name_idx, name) in names.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }
                let seed = round * 1000 + category_idx * 100 + name_idx;
                let product = generate_product(&branch_id, code, name, round, seed)?;
                store.products().insert(&product).await?;
                products.push(product);
                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    // ===== Customers =====
    println!();
    println!("Creating customers...");
    let mut customer_ids = Vec::new();
    for (name, document) in CUSTOMERS {
        let mut customer = Customer::new(&branch_id, *name)?;
        customer.document = Some((*document).to_string());
        store.customers().insert(&customer).await?;
        customer_ids.push(customer.id);
    }
    println!("✓ Created {} customers", customer_ids.len());

    // ===== A pending purchase =====
    println!();
    println!("Creating a pending purchase...");
    let mut purchase = PurchaseDraft::new(&branch_id, "Distribuidora Norte SAC")?;
    for product in products.iter().take(4) {
        purchase.add_line(product, 24, product.cost_cents)?;
    }
    store.purchases().insert_draft(&purchase).await?;
    println!("✓ Purchase {} ({} lines)", purchase.purchase.id, purchase.lines.len());

    // ===== Sale history =====
    println!();
    println!("Generating sale history...");
    let session = Session::new("seed-user", &branch_id)?;
    let mut remaining: Vec<i64> = products.iter().map(|p| p.stock).collect();
    let mut sales_created = 0;

    for days_ago in (0..14).rev() {
        let sales_today = 2 + days_ago % 3;
        for sale_idx in 0..sales_today {
            let seed = days_ago * 10 + sale_idx;
            if let Some(n) = seed_one_sale(
                &store,
                &session,
                &products,
                &mut remaining,
                &customer_ids,
                seed,
                days_ago as i64,
            )
            .await?
            {
                sales_created += n;
            }
        }
    }
    println!("✓ Created {} historical sales", sales_created);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic pseudo-random figures.
fn generate_product(
    branch_id: &str,
    code: &str,
    name: &str,
    round: usize,
    seed: usize,
) -> Result<Product, Box<dyn std::error::Error>> {
    let price_cents = 150 + ((seed * 37) % 2500) as i64;
    let cost_pct = 60 + (seed % 20) as i64; // cost is 60-80% of price
    let cost_cents = price_cents * cost_pct / 100;
    let stock = 5 + (seed % 80) as i64;

    let name = if round == 0 {
        name.to_string()
    } else {
        // Later rounds re-use the base names with a variant suffix to keep
        // SKUs and names unique.
        format!("{} (lote {})", name, round + 1)
    };

    let product = Product::new(NewProduct {
        branch_id: branch_id.to_string(),
        sku: format!("{}-{:04}", code, seed),
        name,
        brand: Some(BRANDS[seed % BRANDS.len()].to_string()),
        category: Some(code.to_string()),
        cost_cents,
        price_cents,
        stock,
        low_stock_threshold: 5,
    })?;
    Ok(product)
}

/// Builds and persists one backdated sale. Returns `Some(1)` when a sale
/// was created, `None` when the picked products had no stock left.
async fn seed_one_sale(
    store: &Store,
    session: &Session,
    products: &[Product],
    remaining: &mut [i64],
    customer_ids: &[String],
    seed: usize,
    days_ago: i64,
) -> Result<Option<usize>, Box<dyn std::error::Error>> {
    let mut cart = Cart::for_session(session);
    let line_count = 1 + seed % 3;

    // Aggregate picks first so a product lands in the cart exactly once.
    let mut picks: Vec<(usize, i64)> = Vec::new();
    for line_idx in 0..line_count {
        let pick = (seed * 7 + line_idx * 13) % products.len();
        let quantity = 1 + ((seed + line_idx) % 3) as i64;
        if let Some(entry) = picks.iter_mut().find(|(p, _)| *p == pick) {
            entry.1 += quantity;
        } else {
            picks.push((pick, quantity));
        }
    }

    for (pick, quantity) in picks {
        if remaining[pick] < quantity {
            continue;
        }
        // Present the product with the stock this run still believes in.
        let mut product = products[pick].clone();
        product.stock = remaining[pick];
        cart.add_line(&product, quantity)?;
        remaining[pick] -= quantity;
    }
    if cart.is_empty() {
        return Ok(None);
    }

    let method = PaymentMethod::ALL[seed % PaymentMethod::ALL.len()];
    cart.select_payment_method(method);
    if seed % 3 == 0 {
        cart.select_customer(Some(customer_ids[seed % customer_ids.len()].clone()));
    }

    let mut draft = build_sale(&cart, session)?;
    draft.header.created_at = Utc::now() - Duration::days(days_ago) - Duration::minutes((seed % 300) as i64);

    store.sales().insert_header(&draft.header).await?;
    store.sales().insert_lines(&draft.lines).await?;
    for line in &draft.lines {
        store
            .products()
            .decrement_or_reject(&line.product_id, line.quantity)
            .await?;
    }

    Ok(Some(1))
}
