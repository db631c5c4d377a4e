//! Pre-1.13 numeric block ids and their flattened names.
//!
//! Only the common building palette is covered; anything else resolves to the
//! registry fallback. Where several `(id, data)` pairs flatten to the same state
//! the first entry is the one written back out.

pub(crate) const LEGACY_BLOCKS: &[(u16, u8, &str)] = &[
    (0, 0, "minecraft:air"),
    (1, 0, "minecraft:stone"),
    (1, 1, "minecraft:granite"),
    (1, 2, "minecraft:polished_granite"),
    (1, 3, "minecraft:diorite"),
    (1, 4, "minecraft:polished_diorite"),
    (1, 5, "minecraft:andesite"),
    (1, 6, "minecraft:polished_andesite"),
    (2, 0, "minecraft:grass_block[snowy=false]"),
    (3, 0, "minecraft:dirt"),
    (3, 1, "minecraft:coarse_dirt"),
    (3, 2, "minecraft:podzol[snowy=false]"),
    (4, 0, "minecraft:cobblestone"),
    (5, 0, "minecraft:oak_planks"),
    (5, 1, "minecraft:spruce_planks"),
    (5, 2, "minecraft:birch_planks"),
    (5, 3, "minecraft:jungle_planks"),
    (5, 4, "minecraft:acacia_planks"),
    (5, 5, "minecraft:dark_oak_planks"),
    (7, 0, "minecraft:bedrock"),
    (8, 0, "minecraft:water[level=0]"),
    (9, 0, "minecraft:water[level=0]"),
    (10, 0, "minecraft:lava[level=0]"),
    (11, 0, "minecraft:lava[level=0]"),
    (12, 0, "minecraft:sand"),
    (12, 1, "minecraft:red_sand"),
    (13, 0, "minecraft:gravel"),
    (14, 0, "minecraft:gold_ore"),
    (15, 0, "minecraft:iron_ore"),
    (16, 0, "minecraft:coal_ore"),
    (17, 0, "minecraft:oak_log[axis=y]"),
    (17, 1, "minecraft:spruce_log[axis=y]"),
    (17, 2, "minecraft:birch_log[axis=y]"),
    (17, 3, "minecraft:jungle_log[axis=y]"),
    (17, 4, "minecraft:oak_log[axis=x]"),
    (17, 8, "minecraft:oak_log[axis=z]"),
    (18, 0, "minecraft:oak_leaves[distance=7,persistent=false]"),
    (18, 1, "minecraft:spruce_leaves[distance=7,persistent=false]"),
    (18, 2, "minecraft:birch_leaves[distance=7,persistent=false]"),
    (18, 3, "minecraft:jungle_leaves[distance=7,persistent=false]"),
    (19, 0, "minecraft:sponge"),
    (20, 0, "minecraft:glass"),
    (21, 0, "minecraft:lapis_ore"),
    (22, 0, "minecraft:lapis_block"),
    (24, 0, "minecraft:sandstone"),
    (24, 1, "minecraft:chiseled_sandstone"),
    (24, 2, "minecraft:cut_sandstone"),
    (25, 0, "minecraft:note_block[instrument=harp,note=0,powered=false]"),
    (35, 0, "minecraft:white_wool"),
    (35, 1, "minecraft:orange_wool"),
    (35, 2, "minecraft:magenta_wool"),
    (35, 3, "minecraft:light_blue_wool"),
    (35, 4, "minecraft:yellow_wool"),
    (35, 5, "minecraft:lime_wool"),
    (35, 6, "minecraft:pink_wool"),
    (35, 7, "minecraft:gray_wool"),
    (35, 8, "minecraft:light_gray_wool"),
    (35, 9, "minecraft:cyan_wool"),
    (35, 10, "minecraft:purple_wool"),
    (35, 11, "minecraft:blue_wool"),
    (35, 12, "minecraft:brown_wool"),
    (35, 13, "minecraft:green_wool"),
    (35, 14, "minecraft:red_wool"),
    (35, 15, "minecraft:black_wool"),
    (37, 0, "minecraft:dandelion"),
    (38, 0, "minecraft:poppy"),
    (41, 0, "minecraft:gold_block"),
    (42, 0, "minecraft:iron_block"),
    (45, 0, "minecraft:bricks"),
    (46, 0, "minecraft:tnt[unstable=false]"),
    (47, 0, "minecraft:bookshelf"),
    (48, 0, "minecraft:mossy_cobblestone"),
    (49, 0, "minecraft:obsidian"),
    (50, 5, "minecraft:torch"),
    (52, 0, "minecraft:spawner"),
    (54, 2, "minecraft:chest[facing=north,type=single,waterlogged=false]"),
    (54, 3, "minecraft:chest[facing=south,type=single,waterlogged=false]"),
    (54, 4, "minecraft:chest[facing=west,type=single,waterlogged=false]"),
    (54, 5, "minecraft:chest[facing=east,type=single,waterlogged=false]"),
    (55, 0, "minecraft:redstone_wire[east=none,north=none,power=0,south=none,west=none]"),
    (56, 0, "minecraft:diamond_ore"),
    (57, 0, "minecraft:diamond_block"),
    (58, 0, "minecraft:crafting_table"),
    (61, 2, "minecraft:furnace[facing=north,lit=false]"),
    (61, 3, "minecraft:furnace[facing=south,lit=false]"),
    (61, 4, "minecraft:furnace[facing=west,lit=false]"),
    (61, 5, "minecraft:furnace[facing=east,lit=false]"),
    (73, 0, "minecraft:redstone_ore[lit=false]"),
    (78, 0, "minecraft:snow[layers=1]"),
    (79, 0, "minecraft:ice"),
    (80, 0, "minecraft:snow_block"),
    (81, 0, "minecraft:cactus[age=0]"),
    (82, 0, "minecraft:clay"),
    (84, 0, "minecraft:jukebox[has_record=false]"),
    (86, 0, "minecraft:carved_pumpkin[facing=south]"),
    (87, 0, "minecraft:netherrack"),
    (88, 0, "minecraft:soul_sand"),
    (89, 0, "minecraft:glowstone"),
    (98, 0, "minecraft:stone_bricks"),
    (98, 1, "minecraft:mossy_stone_bricks"),
    (98, 2, "minecraft:cracked_stone_bricks"),
    (98, 3, "minecraft:chiseled_stone_bricks"),
    (103, 0, "minecraft:melon"),
    (112, 0, "minecraft:nether_bricks"),
    (121, 0, "minecraft:end_stone"),
    (123, 0, "minecraft:redstone_lamp[lit=false]"),
    (129, 0, "minecraft:emerald_ore"),
    (133, 0, "minecraft:emerald_block"),
    (152, 0, "minecraft:redstone_block"),
    (155, 0, "minecraft:quartz_block"),
    (155, 1, "minecraft:chiseled_quartz_block"),
    (159, 0, "minecraft:white_terracotta"),
    (159, 1, "minecraft:orange_terracotta"),
    (159, 4, "minecraft:yellow_terracotta"),
    (159, 11, "minecraft:blue_terracotta"),
    (159, 14, "minecraft:red_terracotta"),
    (159, 15, "minecraft:black_terracotta"),
    (165, 0, "minecraft:slime_block"),
    (168, 0, "minecraft:prismarine"),
    (168, 1, "minecraft:prismarine_bricks"),
    (168, 2, "minecraft:dark_prismarine"),
    (169, 0, "minecraft:sea_lantern"),
    (170, 0, "minecraft:hay_block[axis=y]"),
    (172, 0, "minecraft:terracotta"),
    (173, 0, "minecraft:coal_block"),
    (174, 0, "minecraft:packed_ice"),
    (201, 0, "minecraft:purpur_block"),
    (206, 0, "minecraft:end_stone_bricks"),
    (213, 0, "minecraft:magma_block"),
    (214, 0, "minecraft:nether_wart_block"),
    (215, 0, "minecraft:red_nether_bricks"),
    (216, 0, "minecraft:bone_block[axis=y]"),
    (251, 0, "minecraft:white_concrete"),
    (251, 1, "minecraft:orange_concrete"),
    (251, 2, "minecraft:magenta_concrete"),
    (251, 3, "minecraft:light_blue_concrete"),
    (251, 4, "minecraft:yellow_concrete"),
    (251, 5, "minecraft:lime_concrete"),
    (251, 6, "minecraft:pink_concrete"),
    (251, 7, "minecraft:gray_concrete"),
    (251, 8, "minecraft:light_gray_concrete"),
    (251, 9, "minecraft:cyan_concrete"),
    (251, 10, "minecraft:purple_concrete"),
    (251, 11, "minecraft:blue_concrete"),
    (251, 12, "minecraft:brown_concrete"),
    (251, 13, "minecraft:green_concrete"),
    (251, 14, "minecraft:red_concrete"),
    (251, 15, "minecraft:black_concrete"),
];
