use rosterbase::error::StoreError;

fn main() {
    if let Err(err) = rosterbase::run() {
        eprintln!("error: {err}");
        let not_found = err
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_not_found);
        std::process::exit(if not_found { 2 } else { 1 });
    }
}
