//! Basic usage example for zipstream

use zipstream::{CompressionMethod, ZipStreamReader, ZipStreamWriter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== zipstream Basic Example ===\n");

    // Create a ZIP file
    println!("Creating test.zip...");
    let mut writer = ZipStreamWriter::new("test.zip")?;
    writer.add_content("hello.txt", b"Hello, zipstream!")?;
    writer.add_content("folder/nested.txt", b"This is a nested file.")?;
    writer.add_content_with_method(
        "data.txt",
        b"Line 1\nLine 2\nLine 3\n",
        CompressionMethod::Stored,
    )?;
    writer.set_comment("created by the basic example");
    writer.finish()?;
    println!("✓ Created test.zip\n");

    // Read it back, front to back
    println!("Reading test.zip...");
    let mut reader = ZipStreamReader::open("test.zip")?;
    while let Some(record) = reader.next_record()? {
        if record.is_file() {
            let content = record.content()?;
            println!(
                "  file {} ({} bytes): {:?}",
                record.filename_lossy(),
                content.len(),
                String::from_utf8_lossy(&content)
            );
        } else {
            println!(
                "  directory entry {} -> local header at {}",
                record.filename_lossy(),
                record.local_header_offset().unwrap_or(0)
            );
        }
    }

    if let Some(end) = reader.end_of_archive() {
        println!(
            "\n{} entries, comment: {:?}",
            end.header.entries_total,
            String::from_utf8_lossy(&end.comment)
        );
    }

    std::fs::remove_file("test.zip")?;
    Ok(())
}
