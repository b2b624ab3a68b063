use minisql::*;

fn main() -> Result<()> {
    println!("Column-Store Database Demo\n");

    // Create DB, persisted in a scratch directory
    let root = std::env::temp_dir().join("minisql-demo");
    let mut db = Database::new(&root);

    // Create table "users"
    db.execute(b"CREATE TABLE users (id INT, name VARCHAR, age INT)")?;
    println!("Created table 'users'");

    // Insert data
    println!("Inserting data...");
    db.execute(b"INSERT INTO users (id, name, age) VALUES (1, 'Alice', 30)")?;
    db.execute(b"INSERT INTO users (id, name) VALUES (2, 'Bob')")?; // Bob's age defaults to 0
    db.execute(b"INSERT INTO users (id, name, age) VALUES (3, 'Charlie', 25)")?;
    println!("Inserted 3 rows\n");

    // Read and Printing data
    println!("Reading data, youngest first:");
    print_rows(&db.query("SELECT * FROM users ORDER BY age ASC")?);

    println!("Adults between 18 and 40:");
    print_rows(&db.query("SELECT name, age FROM users WHERE 18 <= age < 40")?);

    // Raw JSON, as served over HTTP
    let json = db.execute(b"SELECT name FROM users WHERE id = 2")?;
    if let Some(json) = json {
        println!("JSON: {}\n", String::from_utf8_lossy(&json));
    }

    db.execute(b"UPDATE users (age) VALUES (41) WHERE name = 'Bob'")?;
    db.execute(b"DELETE FROM users WHERE age < 26")?;
    println!("After update and delete:");
    print_rows(&db.query("SELECT * FROM users")?);

    // Persist, then read back into a fresh database
    db.save()?;
    let mut reloaded = Database::new(&root);
    reloaded.load()?;

    println!("Tables in {}:", root.display());
    for table_name in reloaded.list_tables() {
        println!("  - {}", table_name);
    }

    Ok(())
}

fn print_rows(data: &TableData) {
    for name in &data.columns {
        print!("{:<10}", name.to_uppercase());
    }
    println!();
    println!("{}", "-".repeat(10 * data.columns.len()));

    for row in &data.rows {
        for value in row {
            print!("{:<10}", value);
        }
        println!();
    }
    println!();
}
