//! Human readable listing of the cached favourites

use crate::metadata_retrieval::{Cache, CacheEntry};
use std::io::{self, Write};

/// Header line printed above the listing
pub const LISTING_HEADER: &str = "Listing series and files from cache";

/// Writes one line per cache entry, sorted by slug
///
/// Slugs are right-aligned to the widest slug, followed by the kind of the
/// record and its name:
///
/// ```text
///        the-glory: Series: The Glory
/// the-postman-1994:  Movie: The Postman
/// ```
pub fn write_slugs<W: Write>(cache: &Cache, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{}", LISTING_HEADER)?;

    let width = cache
        .keys()
        .map(|slug| slug.chars().count())
        .max()
        .unwrap_or(0);

    // BTreeMap iterates in lexicographic slug order
    for (slug, entry) in cache {
        let kind = match entry {
            CacheEntry::Series(_) => "Series",
            CacheEntry::Movie(_) => " Movie",
        };
        writeln!(writer, "{:>width$}: {}: {}", slug, kind, entry.name(), width = width)?;
    }

    Ok(())
}
