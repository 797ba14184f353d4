use colored::*;

pub fn print_new_token() {
    let token = porchlight_cli::middleware::generate_token();

    println!("{}", "New admin token".blue().bold());
    println!();
    println!("  {}", token.green());
    println!();
    println!(
        "{}",
        "Set it as ADMIN_API_TOKEN and send it in the X-Admin-Token header.".dimmed()
    );
}
