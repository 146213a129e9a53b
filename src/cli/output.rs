use crate::migrate::Summary;

pub fn print_summary(summary: &Summary) {
    let table = summary.display();
    if table.is_empty() {
        return;
    }
    println!();
    print!("{table}");
}
