//! The handbook's content, declared as a block sequence.

use crate::model::{
    Cell, CellRange, ContentBlock, ContentBuilder, DecorativeBox, TableBlock, TableRule,
    VerticalAlignment,
};
use crate::palette::Palette;
use crate::style::{HorizontalAlignment, StyleId};

const GRID_WIDTH_PT: f64 = 0.25;

/// Assembles the full handbook.
pub fn handbook_content(palette: &Palette) -> Vec<ContentBlock> {
    ContentBuilder::new()
        .extend(cover(palette))
        .extend(table_of_contents())
        .extend(world_of_jujutsu())
        .extend(character_creation(palette))
        .extend(archetypes(palette))
        .extend(sample_characters())
        .extend(starter_module())
        .extend(bestiary())
        .extend(index())
        .finish()
}

fn cover(palette: &Palette) -> ContentBuilder {
    ContentBuilder::new()
        .spacer(40.0)
        .paragraph(
            "Jujutsu Kaisen:\n**The Cursed Energy Handbook**",
            StyleId::CoverTitle,
        )
        .spacer(10.0)
        .paragraph("A modern roleplaying sourcebook — A4 layout", StyleId::Subtitle)
        .spacer(8.0)
        .spacer(12.0)
        .paragraph(
            "A homebrew Jujutsu Kaisen tabletop system. Includes archetypes, cursed energy \
             mechanics, domains, bestiary, sample characters, and a starter module.",
            StyleId::Normal,
        )
        .spacer(20.0)
        .decorative_box(DecorativeBox {
            width: 160.0,
            height: 40.0,
            fill: palette.violet,
            border_color: palette.crimson,
            border_width: 2.0,
        })
        .page_break()
}

fn table_of_contents() -> ContentBuilder {
    let chapters = [
        "1. The World of Jujutsu",
        "2. Character Creation",
        "3. Cursed Energy System",
        "4. Archetypes (Classes)",
    ];
    let archetypes = [
        "4.1 Cursed Technique User",
        "4.2 Cursed Tool Specialist",
        "4.3 Shikigami Summoner",
        "4.4 Reverse Curse User",
        "4.5 Domain Specialist",
        "4.6 Vessel / Contract User",
    ];
    let closing = [
        "5. Combat & Techniques",
        "6. Bestiary",
        "7. Game Master Tools",
        "Appendix: Sample Characters, Starter Module, Index",
    ];

    let builder = ContentBuilder::new().heading("Table of Contents", 1);
    let builder = chapters
        .into_iter()
        .fold(builder, |builder, entry| builder.paragraph(entry, StyleId::Toc));
    let builder = archetypes
        .into_iter()
        .fold(builder, |builder, entry| builder.paragraph(entry, StyleId::TocSub));
    closing
        .into_iter()
        .fold(builder, |builder, entry| builder.paragraph(entry, StyleId::Toc))
        .page_break()
}

fn world_of_jujutsu() -> ContentBuilder {
    let lore = TableBlock::new(
        vec![vec![
            Cell::styled(
                "Curses: manifestations of fear, hatred, and malice. They range from harmless \
                 apparitions to Special Grade horrors that warp reality.",
                StyleId::Normal,
            ),
            Cell::styled(
                "Society: Jujutsu schools like Tokyo and Kyoto teach sorcerers to control cursed \
                 energy, enforce binding vows, and police curses.",
                StyleId::Normal,
            ),
        ]],
        vec![85.0, 85.0],
    )
    .with_rules([
        TableRule::VerticalAlign {
            range: CellRange::all(),
            align: VerticalAlignment::Top,
        },
        TableRule::LeftPadding {
            range: CellRange::all(),
            points: 6.0,
        },
    ]);

    ContentBuilder::new()
        .heading("Chapter 1: The World of Jujutsu", 1)
        .paragraph(
            "Curses are born from the negative emotions of humanity. Jujutsu Sorcerers \
             manipulate cursed energy to exorcise these manifestations...",
            StyleId::Normal,
        )
        .spacer(6.0)
        .table(lore)
        .page_break()
}

/// Grid, light text and a fixed font size over the whole table.
fn stat_table_rules(palette: &Palette, font_size: u8) -> [TableRule; 3] {
    [
        TableRule::TextColor {
            range: CellRange::all(),
            color: palette.text_light,
        },
        TableRule::Grid {
            range: CellRange::all(),
            width_pt: GRID_WIDTH_PT,
            color: palette.grid,
        },
        TableRule::FontSize {
            range: CellRange::all(),
            size: font_size,
        },
    ]
}

fn character_creation(palette: &Palette) -> ContentBuilder {
    let backgrounds = TableBlock::new(
        vec![
            vec!["Student of Jujutsu Tech", "Gain Arcana & Insight"],
            vec!["Cursed Tool Apprentice", "Gain Athletics & Sleight of Hand"],
            vec!["Exorcist's Lineage", "Gain History & Religion"],
            vec!["Survivor of a Curse Attack", "Gain Perception & Stealth"],
            vec!["Vessel / Pact-Bound", "Gain Intimidation & Deception"],
        ],
        vec![60.0, 100.0],
    )
    .with_alignment(HorizontalAlignment::Left)
    .with_rule(TableRule::Background {
        range: CellRange::row(0),
        color: palette.paper,
    })
    .with_rules(stat_table_rules(palette, 10))
    .with_rule(TableRule::LeftPadding {
        range: CellRange::all(),
        points: 6.0,
    });

    ContentBuilder::new()
        .heading("Chapter 2: Character Creation", 1)
        .heading("Backgrounds", 2)
        .table(backgrounds)
        .spacer(6.0)
        .heading("Cursed Energy Points (CEP)", 2)
        .paragraph(
            "CEP = 10 + Level + CON modifier + WIS modifier. CEP recovers fully on a long rest, \
             and half on a short rest. Players may convert HP to CEP at the rate 1 HP → 1 CEP.",
            StyleId::Normal,
        )
        .page_break()
}

fn archetypes(palette: &Palette) -> ContentBuilder {
    let levels = TableBlock::new(
        vec![
            vec!["Level", "Feature", "CEP Cost"],
            vec!["1", "Signature Technique (choose one)", "Varies (3–5)"],
            vec!["5", "Technique Extension", "+2 CEP"],
            vec!["10", "Domain Expansion (unstable)", "10 CEP"],
            vec!["15", "Domain Perfection", "n/a"],
            vec!["20", "True Technique Evolution", "n/a"],
        ],
        vec![25.0, 100.0, 30.0],
    )
    .with_rule(TableRule::Background {
        range: CellRange::row(0),
        color: palette.violet,
    })
    .with_rules(stat_table_rules(palette, 10));

    let techniques = TableBlock::new(
        vec![
            vec!["Technique", "Effect", "Sample Flavor"],
            vec!["Cursed Speech", "Command/paralyze (WIS save)", "Inumaki-style"],
            vec!["Ratio", "Strike weak points for increased damage", "Nanami-style"],
            vec!["Boogie Woogie", "Swap positions of entities", "Todo-style"],
            vec!["Shadow Binding", "Control enemy movement via shadows", "Megumi-inspired"],
        ],
        vec![50.0, 70.0, 35.0],
    )
    .with_rule(TableRule::Background {
        range: CellRange::row(0),
        color: palette.crimson,
    })
    .with_rules(stat_table_rules(palette, 9));

    ContentBuilder::new()
        .heading("Chapter 4: Archetypes (Classes)", 1)
        .heading("4.1 Cursed Technique User", 2)
        .paragraph(
            "Specializes in a unique cursed technique. Choose a Signature Technique at Level 1 \
             and evolve it as you level.",
            StyleId::Normal,
        )
        .table(levels)
        .spacer(6.0)
        .heading("Example Signature Techniques", 2)
        .table(techniques)
        .page_break()
}

fn sample_characters() -> ContentBuilder {
    ContentBuilder::new()
        .heading("Appendix: Sample Characters", 1)
        .heading("Yuji Itadori (Sample PC)", 2)
        .paragraph(
            "Archetype: Vessel / Contract User \
             Level: 3 \
             CEP: 10 + 3 + CON_mod + WIS_mod = (example) \
             Background: Survivor of a curse attack \
             Abilities: Enhanced physicals, fast healer, can host an inner curse (Sukuna analogue) \
             Equipment: None (relies on body and cursed energy) \
             Playstyle notes: Close-quarters combatant with burst CEP usage.",
            StyleId::Normal,
        )
        .spacer(6.0)
        .heading("Satoru Gojo (NPC/Legendary Template)", 2)
        .paragraph(
            "Archetype: Domain Specialist / Unique Technique User \
             Level: Legendary (GM only) \
             Signature: Infinity-like barrier (flavored) \
             Notes: Use as high-level NPC with Domain Perfection and Reality Rewrite.",
            StyleId::Normal,
        )
        .page_break()
}

fn starter_module() -> ContentBuilder {
    ContentBuilder::new()
        .heading("Starter Module: The Haunting of Higan Shrine", 1)
        .heading("Adventure Summary", 2)
        .paragraph(
            "The players are new recruits assigned to investigate a rural shrine where villagers \
             have been disappearing...",
            StyleId::Normal,
        )
        .spacer(6.0)
        .page_break()
}

fn bestiary() -> ContentBuilder {
    ContentBuilder::new()
        .heading("Bestiary (Sample Entries)", 1)
        .heading("Grade 4: Hollowchild", 2)
        .paragraph(
            "HP: 12 | Damage: 1d6 | Abilities: Haunting Wail (debuff), Possess small objects. \
             Tactics: Harass and separate party members.",
            StyleId::Normal,
        )
        .page_break()
}

fn index() -> ContentBuilder {
    ContentBuilder::new().heading("Index", 1).paragraph(
        "This index is a placeholder. After final edits, update page numbers and index entries.",
        StyleId::Normal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::validate;
    use crate::geometry::PageGeometry;

    #[test]
    fn handbook_fits_default_geometry() {
        let blocks = handbook_content(&Palette::default());
        validate(&blocks, &PageGeometry::default()).expect("handbook content is valid");
    }

    #[test]
    fn handbook_declares_eight_page_breaks() {
        let blocks = handbook_content(&Palette::default());
        let breaks = blocks
            .iter()
            .filter(|block| matches!(block, ContentBlock::PageBreak))
            .count();
        assert_eq!(breaks, 8);
        assert!(!matches!(blocks.last(), Some(ContentBlock::PageBreak)));
    }

    #[test]
    fn chapters_open_with_level_one_headings() {
        let blocks = handbook_content(&Palette::default());
        let chapters: Vec<&str> = blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Heading { text, level: 1 } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            chapters,
            vec![
                "Table of Contents",
                "Chapter 1: The World of Jujutsu",
                "Chapter 2: Character Creation",
                "Chapter 4: Archetypes (Classes)",
                "Appendix: Sample Characters",
                "Starter Module: The Haunting of Higan Shrine",
                "Bestiary (Sample Entries)",
                "Index",
            ]
        );
    }

    #[test]
    fn body_paragraphs_flow_and_subtitle_keeps_authored_text() {
        let blocks = handbook_content(&Palette::default());
        let paragraphs = || {
            blocks.iter().filter_map(|block| match block {
                ContentBlock::Paragraph { text, style } => Some((text.as_str(), *style)),
                _ => None,
            })
        };

        for (text, _) in paragraphs().filter(|(_, style)| *style == StyleId::Normal) {
            assert!(!text.contains('\n'), "forced break in {text:?}");
        }
        let yuji = paragraphs()
            .map(|(text, _)| text)
            .find(|text| text.starts_with("Archetype: Vessel"))
            .expect("Yuji's sheet");
        assert!(yuji.contains("Contract User Level: 3 CEP:"), "{yuji}");

        let subtitle = paragraphs()
            .find(|(_, style)| *style == StyleId::Subtitle)
            .map(|(text, _)| text);
        assert_eq!(subtitle, Some("A modern roleplaying sourcebook — A4 layout"));
    }

    #[test]
    fn cover_ends_with_crest_before_first_break() {
        let blocks = handbook_content(&Palette::default());
        let first_break = blocks
            .iter()
            .position(|block| matches!(block, ContentBlock::PageBreak))
            .expect("page break");
        assert!(matches!(
            blocks[first_break - 1],
            ContentBlock::DecorativeBox(DecorativeBox { width, .. }) if width == 160.0
        ));
    }
}
