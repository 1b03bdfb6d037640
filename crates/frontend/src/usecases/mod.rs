pub mod u501_scan_goods_movement;
