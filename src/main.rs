fn main() -> std::io::Result<()> {
    venue_atlas_lib::run()
}
